use axum::extract::State;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::Result;
use crate::user::User;

/// Handler listing friends of the user.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.users.friends(user.id).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::router::tests::{json, register, state};
    use crate::{app, make_request};

    #[tokio::test]
    async fn test_friends() {
        let (state, _) = state();
        let (a, token) = register(&state, "a", true).await;
        let (b, _) = register(&state, "b", true).await;

        let empty = make_request(
            app(state.clone()),
            Method::GET,
            "/users/friends",
            "",
            Some(&token),
        )
        .await;
        assert_eq!(json(empty).await, serde_json::json!([]));

        let request = state.friends.send(b.id, a.id).await.unwrap();
        state.friends.accept(request.id, a.id).await.unwrap();

        let response =
            make_request(app(state), Method::GET, "/users/friends", "", Some(&token))
                .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body[0]["_id"], b.id.to_string());
        assert!(body[0].get("password").is_none());
    }
}
