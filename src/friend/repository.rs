//! Friend request persistence port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::friend::{FriendRequest, RequestStatus};

/// Storage of [`FriendRequest`] records.
///
/// Implementations must enforce, at write time, that at most one request
/// exists per unordered pair of users.
#[async_trait]
pub trait FriendRequestRepository: Send + Sync {
    /// Store a new request, failing with a conflict if the pair already has
    /// one.
    async fn insert_request(&self, request: &FriendRequest) -> Result<()>;

    /// Find a request by its identifier.
    async fn find_request(&self, id: Uuid) -> Result<Option<FriendRequest>>;

    /// Any request between `a` and `b`, whatever its direction or status.
    async fn find_between(&self, a: Uuid, b: Uuid)
    -> Result<Option<FriendRequest>>;

    /// Accept a pending request and befriend both users, atomically.
    ///
    /// Fails with a conflict if the request is no longer pending.
    async fn accept_request(&self, id: Uuid) -> Result<FriendRequest>;

    /// Requests received by `recipient` with the given status, oldest first.
    async fn find_received(
        &self,
        recipient: Uuid,
        status: RequestStatus,
    ) -> Result<Vec<FriendRequest>>;

    /// Requests sent by `sender` with the given status, oldest first.
    async fn find_sent(
        &self,
        sender: Uuid,
        status: RequestStatus,
    ) -> Result<Vec<FriendRequest>>;
}
