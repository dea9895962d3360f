//! Account lifecycle: signup, login, logout, onboarding.
mod login;
mod logout;
mod me;
mod onboarding;
mod signup;

use axum::routing::{get, post};
use axum::{Router, middleware};
use serde::Serialize;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::middleware::authenticate;
use crate::user::User;

/// Body returned by every auth route.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl AuthResponse {
    fn new(message: &'static str, user: Option<User>) -> Self {
        Self {
            success: true,
            message,
            user,
        }
    }
}

/// Unwrap required body fields, failing with every absent or empty one.
fn required<const N: usize>(
    fields: [(&'static str, Option<String>); N],
) -> Result<[String; N]> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(name, _)| *name)
        .collect();

    if !missing.is_empty() {
        return Err(ServerError::MissingFields(missing));
    }

    Ok(fields.map(|(_, value)| value.unwrap_or_default()))
}

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        // `POST /auth/onboarding` goes to `onboarding`. Authorization required.
        .route("/auth/onboarding", post(onboarding::handler))
        // `GET /auth/me` goes to `me`. Authorization required.
        .route("/auth/me", get(me::handler))
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    Router::new()
        .route("/auth/signup", post(signup::handler))
        .route("/auth/login", post(login::handler))
        .route("/auth/logout", post(logout::handler))
        .merge(protected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields() {
        let [a, b] = required([("a", Some("1".into())), ("b", Some("2".into()))])
            .unwrap();
        assert_eq!((a.as_str(), b.as_str()), ("1", "2"));

        match required([("a", None), ("b", Some("2".into())), ("c", Some(String::new()))]) {
            Err(ServerError::MissingFields(fields)) => {
                assert_eq!(fields, vec!["a", "c"])
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
