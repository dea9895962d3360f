use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::{AuthResponse, required};
use crate::AppState;
use crate::chat;
use crate::error::Result;
use crate::router::Payload;
use crate::session::issue_cookie;
use crate::user::UserBuilder;

#[derive(Debug, Deserialize)]
pub struct Body {
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

/// Handler to create user.
pub async fn handler(
    State(state): State<AppState>,
    Payload(body): Payload<Body>,
) -> Result<impl IntoResponse> {
    let [email, password, name] = required([
        ("email", body.email),
        ("password", body.password),
        ("name", body.name),
    ])?;

    let new_user = UserBuilder::new()
        .email(email)
        .password(password)
        .name(name)
        .build();
    let user = state.users.signup(new_user).await?;

    chat::sync_user(state.chat.as_ref(), &user).await;

    let token = state.token.create(&user.id)?;
    let cookie = issue_cookie(
        &token,
        state.token.lifetime(),
        state.config.secure_cookies(),
    )?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::new("User created successfully.", Some(user))),
    ))
}
