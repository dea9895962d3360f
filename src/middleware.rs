//! Middlewares for routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::session::extract_token;

/// Reject requests without a valid identity token.
///
/// The authenticated [`crate::user::User`] is inserted in request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let user_id = extract_token(req.headers())
        .and_then(|token| state.token.verify(&token))
        .ok_or(ServerError::Unauthorized)?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(ServerError::Unauthorized)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
