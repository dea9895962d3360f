//! Chat token HTTP API. Authorization required.

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router, middleware};
use serde::Serialize;

use crate::AppState;
use crate::error::Result;
use crate::middleware::authenticate;
use crate::user::User;

#[derive(Debug, Serialize)]
pub struct Response {
    token: String,
}

/// Handler minting a chat token for the user.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Response>> {
    let token = state.chat.create_token(&user.id.to_string()).await?;

    Ok(Json(Response { token }))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `GET /chat` and `GET /chat/` go to `handler`.
        .route("/chat", get(handler))
        .route("/chat/", get(handler))
        .route_layer(middleware::from_fn_with_state(state, authenticate))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Method, StatusCode};

    use crate::router::tests::{json, register, state};
    use crate::{app, make_request};

    #[tokio::test]
    async fn test_chat_token() {
        let (state, _) = state();
        let (user, token) = register(&state, "ann", true).await;

        for path in ["/chat", "/chat/"] {
            let response =
                make_request(app(state.clone()), Method::GET, path, "", Some(&token))
                    .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(json(response).await["token"], format!("chat-{}", user.id));
        }

        let response = make_request(app(state), Method::GET, "/chat/", "", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_disabled_chat() {
        let (mut state, _) = state();
        state.chat = Arc::new(crate::chat::Disabled);
        let (_, token) = register(&state, "ann", true).await;

        let response =
            make_request(app(state), Method::GET, "/chat/", "", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
