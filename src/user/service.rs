use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::crypto::PasswordManager;
use crate::error::{Result, ServerError};
use crate::user::{NewUser, ProfileDraft, User, UserRepository};

/// Maximum number of learners suggested at once.
pub const RECOMMENDATION_LIMIT: usize = 10;

pub const EMAIL_TAKEN: &str = "User already exists, use a different email.";

/// User directory manager.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    crypto: Arc<PasswordManager>,
}

impl UserService {
    /// Create a new [`UserService`].
    pub fn new(repo: Arc<dyn UserRepository>, crypto: Arc<PasswordManager>) -> Self {
        Self { repo, crypto }
    }

    /// Register a new, unverified account.
    ///
    /// The credential is hashed here, once, since it is being created.
    pub async fn signup(&self, new_user: NewUser) -> Result<User> {
        new_user.validate()?;

        if self.repo.find_by_email(&new_user.email).await?.is_some() {
            return Err(ServerError::Conflict(EMAIL_TAKEN));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password: self.crypto.hash_password(&new_user.password)?,
            name: new_user.name,
            profile_picture: new_user.profile_picture,
            is_verified: false,
            is_admin: false,
            friends: Vec::new(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        };

        self.repo.insert(&user).await?;
        tracing::info!(user_id = %user.id, "user signed up");

        Ok(user)
    }

    /// Check credentials.
    ///
    /// Unknown email and wrong password are indistinguishable.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let Some(user) = self.repo.find_by_email(email).await? else {
            return Err(ServerError::InvalidCredentials);
        };

        if !self.crypto.verify_password(password, &user.password) {
            return Err(ServerError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.repo.find_by_id(id).await
    }

    /// Fill profile and mark user as verified.
    pub async fn onboard(&self, id: Uuid, draft: ProfileDraft) -> Result<User> {
        let profile = draft.complete()?;
        profile.validate()?;

        let user = self
            .repo
            .complete_profile(id, &profile)
            .await?
            .ok_or(ServerError::NotFound("User not found."))?;
        tracing::info!(user_id = %id, "user onboarded");

        Ok(user)
    }

    /// Friends of user `id`.
    pub async fn friends(&self, id: Uuid) -> Result<Vec<User>> {
        self.repo.find_friends(id).await
    }

    /// Learners `id` could befriend.
    pub async fn recommend(&self, id: Uuid) -> Result<Vec<User>> {
        self.repo.recommend(id, RECOMMENDATION_LIMIT).await
    }
}
