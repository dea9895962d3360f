//! Friend request ledger.
//!
//! A request goes `pending -> accepted`, only by its recipient, and never
//! back. Declining is not supported: an unanswered request simply stays
//! pending.
mod repository;
mod service;

pub use repository::*;
pub use service::*;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::PublicProfile;

/// Lifecycle of a [`FriendRequest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status text read from storage.
#[derive(Debug, thiserror::Error)]
#[error("unknown friend request status `{0}`")]
pub struct UnknownStatus(String);

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Directed offer of friendship.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub sender: Uuid,
    pub recipient: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FriendRequest {
    /// Create a new pending request.
    pub fn new(sender: Uuid, recipient: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            sender,
            recipient,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this request links `a` and `b`, in either direction.
    pub fn links(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender == a && self.recipient == b)
            || (self.sender == b && self.recipient == a)
    }
}

/// Either side of a listed request: a bare id, or the joined profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Party {
    Profile(PublicProfile),
    Id(Uuid),
}

impl Party {
    pub fn id(&self) -> Uuid {
        match self {
            Party::Profile(profile) => profile.id,
            Party::Id(id) => *id,
        }
    }
}

/// [`FriendRequest`] with the counterpart's profile joined.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub sender: Party,
    pub recipient: Party,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
