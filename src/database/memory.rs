//! In-process storage.
//!
//! One lock guards users and requests together, so every check-then-act
//! sequence is serialized.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::friend::{
    ALREADY_ACCEPTED, FriendRequest, FriendRequestRepository, REQUEST_EXISTS,
    REQUEST_NOT_FOUND, RequestStatus,
};
use crate::user::{EMAIL_TAKEN, Profile, PublicProfile, User, UserRepository};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    /// Insertion order is kept for listings.
    requests: Vec<FriendRequest>,
}

/// Memory-backed [`UserRepository`] and [`FriendRequestRepository`].
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| ServerError::internal("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| ServerError::internal("memory store lock poisoned"))
    }
}

fn sorted(mut users: Vec<User>) -> Vec<User> {
    users.sort_by_key(|u| u.id);
    users
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> Result<()> {
        let mut state = self.write()?;

        if state.users.values().any(|u| u.email == user.email) {
            return Err(ServerError::Conflict(EMAIL_TAKEN));
        }

        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn complete_profile(
        &self,
        id: Uuid,
        profile: &Profile,
    ) -> Result<Option<User>> {
        let mut state = self.write()?;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };

        user.name = profile.name.clone();
        user.bio = profile.bio.clone();
        user.native_language = profile.native_language.clone();
        user.learning_language = profile.learning_language.clone();
        user.country = profile.country.clone();
        if let Some(picture) = &profile.profile_picture {
            user.profile_picture = picture.clone();
        }
        user.is_verified = true;
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn find_friends(&self, id: Uuid) -> Result<Vec<User>> {
        let state = self.read()?;
        let Some(user) = state.users.get(&id) else {
            return Ok(Vec::new());
        };

        Ok(sorted(
            user.friends
                .iter()
                .filter_map(|friend| state.users.get(friend).cloned())
                .collect(),
        ))
    }

    async fn recommend(&self, id: Uuid, limit: usize) -> Result<Vec<User>> {
        let state = self.read()?;
        let friends = state
            .users
            .get(&id)
            .map(|u| u.friends.as_slice())
            .unwrap_or_default();

        let mut candidates = sorted(
            state
                .users
                .values()
                .filter(|u| {
                    u.id != id && u.is_verified && !friends.contains(&u.id)
                })
                .cloned()
                .collect(),
        );
        candidates.truncate(limit);

        Ok(candidates)
    }

    async fn find_profiles(&self, ids: &[Uuid]) -> Result<Vec<PublicProfile>> {
        let state = self.read()?;

        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .map(User::public_profile)
            .collect())
    }
}

#[async_trait]
impl FriendRequestRepository for MemoryStore {
    async fn insert_request(&self, request: &FriendRequest) -> Result<()> {
        let mut state = self.write()?;

        if state
            .requests
            .iter()
            .any(|r| r.links(request.sender, request.recipient))
        {
            return Err(ServerError::Conflict(REQUEST_EXISTS));
        }

        state.requests.push(request.clone());
        Ok(())
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<FriendRequest>> {
        Ok(self.read()?.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn find_between(
        &self,
        a: Uuid,
        b: Uuid,
    ) -> Result<Option<FriendRequest>> {
        Ok(self.read()?.requests.iter().find(|r| r.links(a, b)).cloned())
    }

    async fn accept_request(&self, id: Uuid) -> Result<FriendRequest> {
        let mut state = self.write()?;

        let request = state
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ServerError::NotFound(REQUEST_NOT_FOUND))?;
        if request.status != RequestStatus::Pending {
            return Err(ServerError::Conflict(ALREADY_ACCEPTED));
        }
        request.status = RequestStatus::Accepted;
        request.updated_at = Utc::now();
        let request = request.clone();

        for (user, friend) in [
            (request.recipient, request.sender),
            (request.sender, request.recipient),
        ] {
            if let Some(user) = state.users.get_mut(&user) {
                if !user.friends.contains(&friend) {
                    user.friends.push(friend);
                }
            }
        }

        Ok(request)
    }

    async fn find_received(
        &self,
        recipient: Uuid,
        status: RequestStatus,
    ) -> Result<Vec<FriendRequest>> {
        Ok(self
            .read()?
            .requests
            .iter()
            .filter(|r| r.recipient == recipient && r.status == status)
            .cloned()
            .collect())
    }

    async fn find_sent(
        &self,
        sender: Uuid,
        status: RequestStatus,
    ) -> Result<Vec<FriendRequest>> {
        Ok(self
            .read()?
            .requests
            .iter()
            .filter(|r| r.sender == sender && r.status == status)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unique_email() {
        let store = MemoryStore::default();

        store.insert(&user("a@x.com")).await.unwrap();
        assert!(matches!(
            store.insert(&user("a@x.com")).await,
            Err(ServerError::Conflict(_))
        ));
        // Compared as stored.
        assert!(store.insert(&user("A@x.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_pair_uniqueness() {
        let store = MemoryStore::default();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        store.insert_request(&FriendRequest::new(a, b)).await.unwrap();
        assert!(matches!(
            store.insert_request(&FriendRequest::new(b, a)).await,
            Err(ServerError::Conflict(REQUEST_EXISTS))
        ));
    }

    #[tokio::test]
    async fn test_accept_is_single_shot() {
        let store = MemoryStore::default();
        let (a, b) = (user("a@x.com"), user("b@x.com"));
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();
        let request = FriendRequest::new(a.id, b.id);
        store.insert_request(&request).await.unwrap();

        store.accept_request(request.id).await.unwrap();
        assert!(matches!(
            store.accept_request(request.id).await,
            Err(ServerError::Conflict(ALREADY_ACCEPTED))
        ));

        let a = store.find_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(a.friends, vec![b.id]);
        assert_eq!(store.find_friends(b.id).await.unwrap()[0].id, a.id);
    }

    #[tokio::test]
    async fn test_concurrent_accepts_befriend_once() {
        let store = MemoryStore::default();
        let (a, b) = (user("a@x.com"), user("b@x.com"));
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();
        let request = FriendRequest::new(a.id, b.id);
        store.insert_request(&request).await.unwrap();

        let (first, second) = tokio::join!(
            store.accept_request(request.id),
            store.accept_request(request.id)
        );

        assert_eq!([&first, &second].iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            [first, second]
                .into_iter()
                .any(|r| matches!(r, Err(ServerError::Conflict(ALREADY_ACCEPTED))))
        );
        assert_eq!(store.find_by_id(a.id).await.unwrap().unwrap().friends, vec![b.id]);
        assert_eq!(store.find_by_id(b.id).await.unwrap().unwrap().friends, vec![a.id]);
    }

    #[tokio::test]
    async fn test_complete_profile_unknown_user() {
        let store = MemoryStore::default();
        let profile = Profile {
            name: "Ann".into(),
            bio: "x".into(),
            native_language: "en".into(),
            learning_language: "fr".into(),
            country: "US".into(),
            profile_picture: None,
        };

        assert!(
            store
                .complete_profile(Uuid::new_v4(), &profile)
                .await
                .unwrap()
                .is_none()
        );
    }
}
