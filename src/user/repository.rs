//! User directory persistence port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::user::{Profile, PublicProfile, User};

/// Storage of [`User`] records and their friendship edges.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new [`User`].
    ///
    /// Fails with a conflict if the email is already registered.
    async fn insert(&self, user: &User) -> Result<()>;

    /// Find a user using `id` field.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Find a user using `email` field, compared as stored.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Merge onboarding fields and mark the user verified.
    ///
    /// Returns `None` when no user has this `id`. Never touches the
    /// credential.
    async fn complete_profile(
        &self,
        id: Uuid,
        profile: &Profile,
    ) -> Result<Option<User>>;

    /// Users referenced by the friend set of `id`.
    async fn find_friends(&self, id: Uuid) -> Result<Vec<User>>;

    /// Verified users, other than `id` and its friends, ordered by id.
    async fn recommend(&self, id: Uuid, limit: usize) -> Result<Vec<User>>;

    /// Public profiles of the given users. Unknown ids are skipped.
    async fn find_profiles(&self, ids: &[Uuid]) -> Result<Vec<PublicProfile>>;
}
