use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::AppState;
use crate::error::Result;
use crate::friend::FriendRequestView;
use crate::user::User;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequests {
    incoming_requests: Vec<FriendRequestView>,
    accepted_requests: Vec<FriendRequestView>,
}

/// Handler listing pending requests received and sent requests accepted.
pub async fn incoming(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<FriendRequests>> {
    let (incoming_requests, accepted_requests) = tokio::try_join!(
        state.friends.incoming(user.id),
        state.friends.outgoing_accepted(user.id),
    )?;

    Ok(Json(FriendRequests {
        incoming_requests,
        accepted_requests,
    }))
}

/// Handler listing pending requests sent.
pub async fn outgoing(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<FriendRequestView>>> {
    Ok(Json(state.friends.outgoing_pending(user.id).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::router::tests::{json, register, state};
    use crate::{app, make_request};

    #[tokio::test]
    async fn test_friend_requests() {
        let (state, _) = state();
        let (a, a_token) = register(&state, "a", true).await;
        let (b, b_token) = register(&state, "b", true).await;
        let (c, _) = register(&state, "c", true).await;
        state.friends.send(a.id, b.id).await.unwrap();
        let to_c = state.friends.send(a.id, c.id).await.unwrap();
        state.friends.accept(to_c.id, c.id).await.unwrap();

        let response = make_request(
            app(state.clone()),
            Method::GET,
            "/users/friend-requests",
            "",
            Some(&b_token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["incomingRequests"][0]["sender"]["name"], "a");
        assert_eq!(body["incomingRequests"][0]["sender"]["nativeLanguage"], "en");
        assert_eq!(body["acceptedRequests"], serde_json::json!([]));

        let response = make_request(
            app(state.clone()),
            Method::GET,
            "/users/friend-requests",
            "",
            Some(&a_token),
        )
        .await;
        let body = json(response).await;
        assert_eq!(body["incomingRequests"], serde_json::json!([]));
        assert_eq!(body["acceptedRequests"][0]["recipient"]["_id"], c.id.to_string());
        assert_eq!(body["acceptedRequests"][0]["status"], "accepted");

        let response = make_request(
            app(state),
            Method::GET,
            "/users/outgoing-friend-requests",
            "",
            Some(&a_token),
        )
        .await;
        let body = json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["recipient"]["name"], "b");
        assert_eq!(body[0]["sender"], a.id.to_string());
    }
}
