use axum::{Extension, Json};

use super::AuthResponse;
use crate::user::User;

/// Handler returning the authenticated user.
pub async fn handler(Extension(user): Extension<User>) -> Json<AuthResponse> {
    Json(AuthResponse::new("Authenticated user.", Some(user)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::router::tests::{json, register, state};
    use crate::{app, make_request};

    #[tokio::test]
    async fn test_me() {
        let (state, _) = state();
        let (user, token) = register(&state, "ann", false).await;

        let response =
            make_request(app(state), Method::GET, "/auth/me", "", Some(&token)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["user"]["_id"], user.id.to_string());
    }

    #[tokio::test]
    async fn test_me_requires_session() {
        let (state, _) = state();
        let foreign = crate::token::TokenManager::new("tandem", "other")
            .unwrap()
            .create(&uuid::Uuid::new_v4())
            .unwrap();

        for token in [None, Some("garbage"), Some(foreign.as_str())] {
            let response =
                make_request(app(state.clone()), Method::GET, "/auth/me", "", token)
                    .await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_token_of_unknown_user() {
        let (state, _) = state();
        let token = state.token.create(&uuid::Uuid::new_v4()).unwrap();

        let response =
            make_request(app(state), Method::GET, "/auth/me", "", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
