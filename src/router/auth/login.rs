use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::{AuthResponse, required};
use crate::AppState;
use crate::error::Result;
use crate::router::Payload;
use crate::session::issue_cookie;

#[derive(Debug, Deserialize)]
pub struct Body {
    email: Option<String>,
    password: Option<String>,
}

/// Handler to sign in.
pub async fn handler(
    State(state): State<AppState>,
    Payload(body): Payload<Body>,
) -> Result<impl IntoResponse> {
    let [email, password] =
        required([("email", body.email), ("password", body.password)])?;

    let user = state.users.login(&email, &password).await?;
    tracing::info!(user_id = %user.id, "user logged in");

    let token = state.token.create(&user.id)?;
    let cookie = issue_cookie(
        &token,
        state.token.lifetime(),
        state.config.secure_cookies(),
    )?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::new("Login successful.", Some(user))),
    ))
}
