//! Manage json web tokens.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ServerError};

pub const EXPIRATION_TIME: u64 = 60 * 60; // 1 hour.

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the JWT was issued.
    pub iat: u64,
    /// Identifies the organization that issued the JWT.
    pub iss: String,
    /// User ID.
    pub sub: String,
}

/// Manage identity tokens.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    name: String,
    expires_in: u64,
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance signing with HMAC-SHA256.
    pub fn new(name: &str, secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(ServerError::internal("token secret must not be empty"));
        }

        Ok(Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            name: name.to_owned(),
            expires_in: EXPIRATION_TIME,
        })
    }

    /// Override token lifetime, in seconds.
    pub fn expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = seconds;
        self
    }

    /// Token lifetime, in seconds.
    pub fn lifetime(&self) -> u64 {
        self.expires_in
    }

    /// Create a new [`jsonwebtoken`] proving `user_id` identity.
    pub fn create(&self, user_id: &Uuid) -> Result<String> {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| ServerError::internal_from("clock drift", err))?
            .as_secs();
        let claims = Claims {
            exp: time + self.expires_in,
            iat: time,
            iss: self.name.clone(),
            sub: user_id.to_string(),
        };

        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?)
    }

    /// Decode and check a token.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_issuer(&[&self.name]);
        validation.leeway = 0;

        Ok(decode::<Claims>(token, &self.decoding_key, &validation)?.claims)
    }

    /// Decode a token and return the user it identifies.
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        self.decode(token)
            .ok()
            .and_then(|claims| Uuid::parse_str(&claims.sub).ok())
    }
}
