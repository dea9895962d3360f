//! Chat identity synchronisation with the messaging provider.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header, encode};
use reqwest::Client;
use serde::Serialize;

use crate::config::Chat as ChatConfig;
use crate::error::{Result, ServerError};
use crate::user::User;

pub const DEFAULT_BASE_URL: &str = "https://chat.stream-io-api.com";

/// Identity a chat provider knows a user by.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatUser {
    pub id: String,
    pub name: String,
    pub image: String,
}

impl From<&User> for ChatUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            image: user.profile_picture.clone(),
        }
    }
}

/// Third-party messaging service.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Create or update the chat identity of a user.
    async fn upsert_user(&self, user: &ChatUser) -> Result<()>;

    /// Mint a token letting `user_id` connect to the chat.
    async fn create_token(&self, user_id: &str) -> Result<String>;
}

/// Push `user` to the chat provider.
///
/// Failures are logged and swallowed, chat identity is best-effort.
pub async fn sync_user(chat: &dyn ChatProvider, user: &User) {
    match chat.upsert_user(&ChatUser::from(user)).await {
        Ok(()) => tracing::debug!(user_id = %user.id, "chat identity synced"),
        Err(err) => {
            tracing::warn!(user_id = %user.id, error = %err, "chat identity sync failed")
        },
    }
}

#[derive(Serialize)]
struct ServerClaims {
    server: bool,
}

#[derive(Serialize)]
struct UserClaims<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
struct UpsertBody<'a> {
    users: HashMap<&'a str, &'a ChatUser>,
}

/// Stream Chat REST client.
pub struct StreamChat {
    client: Client,
    api_key: String,
    key: EncodingKey,
    base_url: String,
}

impl StreamChat {
    /// Create a new [`StreamChat`] client.
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|err| ServerError::internal_from("chat client", err))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            key: EncodingKey::from_secret(config.api_secret.as_bytes()),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_owned(),
        })
    }

    fn server_token(&self) -> Result<String> {
        Ok(encode(&Header::default(), &ServerClaims { server: true }, &self.key)?)
    }
}

#[async_trait]
impl ChatProvider for StreamChat {
    async fn upsert_user(&self, user: &ChatUser) -> Result<()> {
        let body = UpsertBody {
            users: HashMap::from([(user.id.as_str(), user)]),
        };

        self.client
            .post(format!("{}/users", self.base_url))
            .query(&[("api_key", &self.api_key)])
            .header("Authorization", self.server_token()?)
            .header("Stream-Auth-Type", "jwt")
            .json(&body)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|err| ServerError::internal_from("chat upsert", err))?;

        Ok(())
    }

    async fn create_token(&self, user_id: &str) -> Result<String> {
        Ok(encode(&Header::default(), &UserClaims { user_id }, &self.key)?)
    }
}

/// Provider used when no chat credentials are configured.
pub struct Disabled;

#[async_trait]
impl ChatProvider for Disabled {
    async fn upsert_user(&self, _user: &ChatUser) -> Result<()> {
        Ok(())
    }

    async fn create_token(&self, _user_id: &str) -> Result<String> {
        Err(ServerError::internal("chat is not configured"))
    }
}
