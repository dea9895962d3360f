use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::friend::{
    FriendRequest, FriendRequestRepository, FriendRequestView, Party,
    RequestStatus,
};
use crate::user::{PublicProfile, UserRepository};

pub const SELF_REQUEST: &str = "You cannot send a friend request to yourself.";
pub const RECIPIENT_NOT_FOUND: &str = "Recipient not found.";
pub const ALREADY_FRIENDS: &str = "You are already friends with this user.";
pub const REQUEST_EXISTS: &str =
    "A friend request already exists between you and this user.";
pub const REQUEST_NOT_FOUND: &str = "Friend request not found.";
pub const NOT_RECIPIENT: &str =
    "You are not authorized to accept this friend request.";
pub const ALREADY_ACCEPTED: &str = "Friend request already accepted.";

/// Which side of a request gets its profile joined.
#[derive(Clone, Copy, Debug)]
enum Join {
    Sender,
    Recipient,
}

/// Friend request state machine.
#[derive(Clone)]
pub struct FriendService {
    users: Arc<dyn UserRepository>,
    requests: Arc<dyn FriendRequestRepository>,
}

impl FriendService {
    /// Create a new [`FriendService`].
    pub fn new(
        users: Arc<dyn UserRepository>,
        requests: Arc<dyn FriendRequestRepository>,
    ) -> Self {
        Self { users, requests }
    }

    /// Offer friendship from `sender` to `recipient`.
    ///
    /// Checks run in order: self request, unknown recipient, existing
    /// friendship, existing request in either direction.
    pub async fn send(
        &self,
        sender: Uuid,
        recipient: Uuid,
    ) -> Result<FriendRequest> {
        if sender == recipient {
            return Err(ServerError::Conflict(SELF_REQUEST));
        }

        let target = self
            .users
            .find_by_id(recipient)
            .await?
            .ok_or(ServerError::NotFound(RECIPIENT_NOT_FOUND))?;

        if target.friends.contains(&sender) {
            return Err(ServerError::Conflict(ALREADY_FRIENDS));
        }

        if self.requests.find_between(sender, recipient).await?.is_some() {
            return Err(ServerError::Conflict(REQUEST_EXISTS));
        }

        // Storage re-checks the pair, concurrent senders race there.
        let request = FriendRequest::new(sender, recipient);
        self.requests.insert_request(&request).await?;

        metrics::counter!("friend_requests_total", "status" => "pending")
            .increment(1);
        tracing::info!(
            request_id = %request.id,
            %sender,
            %recipient,
            "friend request sent"
        );

        Ok(request)
    }

    /// Accept request `id` on behalf of `acting_user`.
    pub async fn accept(
        &self,
        id: Uuid,
        acting_user: Uuid,
    ) -> Result<FriendRequest> {
        let request = self
            .requests
            .find_request(id)
            .await?
            .ok_or(ServerError::NotFound(REQUEST_NOT_FOUND))?;

        if request.recipient != acting_user {
            return Err(ServerError::Forbidden(NOT_RECIPIENT));
        }

        if request.status != RequestStatus::Pending {
            return Err(ServerError::Conflict(ALREADY_ACCEPTED));
        }

        let request = self.requests.accept_request(id).await?;

        metrics::counter!("friend_requests_total", "status" => "accepted")
            .increment(1);
        tracing::info!(
            request_id = %request.id,
            sender = %request.sender,
            recipient = %request.recipient,
            "friend request accepted"
        );

        Ok(request)
    }

    /// Pending requests `user` received, with sender profiles.
    pub async fn incoming(&self, user: Uuid) -> Result<Vec<FriendRequestView>> {
        let requests = self
            .requests
            .find_received(user, RequestStatus::Pending)
            .await?;
        self.join(requests, Join::Sender).await
    }

    /// Pending requests `user` sent, with recipient profiles.
    pub async fn outgoing_pending(
        &self,
        user: Uuid,
    ) -> Result<Vec<FriendRequestView>> {
        let requests =
            self.requests.find_sent(user, RequestStatus::Pending).await?;
        self.join(requests, Join::Recipient).await
    }

    /// Requests `user` sent that were accepted, with recipient profiles.
    ///
    /// Requests `user` received and accepted are not part of it.
    pub async fn outgoing_accepted(
        &self,
        user: Uuid,
    ) -> Result<Vec<FriendRequestView>> {
        let requests =
            self.requests.find_sent(user, RequestStatus::Accepted).await?;
        self.join(requests, Join::Recipient).await
    }

    async fn join(
        &self,
        requests: Vec<FriendRequest>,
        side: Join,
    ) -> Result<Vec<FriendRequestView>> {
        let ids: Vec<Uuid> = requests
            .iter()
            .map(|r| match side {
                Join::Sender => r.sender,
                Join::Recipient => r.recipient,
            })
            .collect();

        let profiles: HashMap<Uuid, PublicProfile> = self
            .users
            .find_profiles(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let party = |id: Uuid| match profiles.get(&id) {
            Some(profile) => Party::Profile(profile.clone()),
            None => Party::Id(id),
        };

        Ok(requests
            .into_iter()
            .map(|r| {
                let (sender, recipient) = match side {
                    Join::Sender => (party(r.sender), Party::Id(r.recipient)),
                    Join::Recipient => {
                        (Party::Id(r.sender), party(r.recipient))
                    },
                };

                FriendRequestView {
                    id: r.id,
                    sender,
                    recipient,
                    status: r.status,
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                }
            })
            .collect())
    }
}
