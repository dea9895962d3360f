use axum::extract::State;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::Result;
use crate::user::User;

/// Handler listing learners the user could befriend.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.users.recommend(user.id).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::router::tests::{json, register, state};
    use crate::user::RECOMMENDATION_LIMIT;
    use crate::{app, make_request};

    #[tokio::test]
    async fn test_recommendations_exclude_self_friends_unverified() {
        let (state, _) = state();
        let (me, token) = register(&state, "me", true).await;
        let (friend, _) = register(&state, "friend", true).await;
        let (stranger, _) = register(&state, "stranger", true).await;
        register(&state, "unverified", false).await;

        let request = state.friends.send(me.id, friend.id).await.unwrap();
        state.friends.accept(request.id, friend.id).await.unwrap();

        let response =
            make_request(app(state), Method::GET, "/users", "", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![stranger.id.to_string()]);
    }

    #[tokio::test]
    async fn test_recommendations_are_capped() {
        let (state, _) = state();
        let (_, token) = register(&state, "me", false).await;
        for i in 0..RECOMMENDATION_LIMIT + 2 {
            register(&state, &format!("user{i}"), true).await;
        }

        let response =
            make_request(app(state), Method::GET, "/users", "", Some(&token)).await;
        assert_eq!(
            json(response).await.as_array().unwrap().len(),
            RECOMMENDATION_LIMIT
        );
    }
}
