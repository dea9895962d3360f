use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;

use crate::AppState;
use crate::error::Result;
use crate::friend::REQUEST_NOT_FOUND;
use crate::user::User;

#[derive(Debug, Serialize)]
pub struct Response {
    message: &'static str,
}

/// Handler accepting friend request `id`, as its recipient.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<Response>> {
    let id = super::parse_id(&id, REQUEST_NOT_FOUND)?;
    state.friends.accept(id, user.id).await?;

    Ok(Json(Response {
        message: "Friend request accepted successfully.",
    }))
}
