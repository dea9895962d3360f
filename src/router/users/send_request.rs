use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::AppState;
use crate::error::Result;
use crate::friend::{FriendRequest, RECIPIENT_NOT_FOUND};
use crate::user::User;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    message: &'static str,
    friend_request: FriendRequest,
}

/// Handler offering friendship to user `id`.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<Response>> {
    let recipient = super::parse_id(&id, RECIPIENT_NOT_FOUND)?;
    let friend_request = state.friends.send(user.id, recipient).await?;

    Ok(Json(Response {
        message: "Friend request sent successfully.",
        friend_request,
    }))
}
