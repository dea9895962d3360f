use axum::extract::State;
use axum::{Extension, Json};

use super::AuthResponse;
use crate::AppState;
use crate::chat;
use crate::error::Result;
use crate::router::Payload;
use crate::user::{ProfileDraft, User};

/// Handler completing the profile of the authenticated user.
pub async fn handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Payload(draft): Payload<ProfileDraft>,
) -> Result<Json<AuthResponse>> {
    let user = state.users.onboard(user.id, draft).await?;

    chat::sync_user(state.chat.as_ref(), &user).await;

    Ok(Json(AuthResponse::new("User verified successfully.", Some(user))))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::router::tests::{json, register, state};
    use crate::{app, make_request};

    const FULL: &str = r#"{"name":"Ann","bio":"x","nativeLanguage":"en","learningLanguage":"fr","country":"US"}"#;

    #[tokio::test]
    async fn test_onboarding() {
        let (state, chat) = state();
        let (user, token) = register(&state, "ann", false).await;

        let response = make_request(
            app(state.clone()),
            Method::POST,
            "/auth/onboarding",
            FULL,
            Some(&token),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["user"]["isVerified"], true);
        assert_eq!(body["user"]["country"], "US");
        assert_eq!(body["user"]["profilePicture"], user.profile_picture);

        // Signup by service does not sync, onboarding does.
        assert_eq!(chat.upserts.lock().unwrap().len(), 1);

        let login = make_request(
            app(state),
            Method::POST,
            "/auth/login",
            r#"{"email":"ann@x.com","password":"secret1"}"#,
            None,
        )
        .await;
        assert_eq!(login.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_field_is_listed() {
        let (state, _) = state();
        let (_, token) = register(&state, "ann", false).await;

        let response = make_request(
            app(state),
            Method::POST,
            "/auth/onboarding",
            r#"{"name":"","bio":"x","nativeLanguage":"en","learningLanguage":"fr","country":"US"}"#,
            Some(&token),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json(response).await["missingFields"],
            serde_json::json!(["name"])
        );
    }

    #[tokio::test]
    async fn test_profile_picture_override() {
        let (state, _) = state();
        let (_, token) = register(&state, "ann", false).await;
        let body = FULL.replace('}', r#","profilePicture":"https://cdn.example/a.png"}"#);

        let response = make_request(
            app(state),
            Method::POST,
            "/auth/onboarding",
            &body,
            Some(&token),
        )
        .await;

        assert_eq!(
            json(response).await["user"]["profilePicture"],
            "https://cdn.example/a.png"
        );
    }

    #[tokio::test]
    async fn test_empty_profile_picture_keeps_avatar() {
        let (state, _) = state();
        let (user, token) = register(&state, "ann", false).await;
        let body = FULL.replace('}', r#","profilePicture":""}"#);

        let response = make_request(
            app(state.clone()),
            Method::POST,
            "/auth/onboarding",
            &body,
            Some(&token),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json(response).await["user"]["profilePicture"],
            user.profile_picture
        );

        // Missing fields win over the picture.
        let (_, token) = register(&state, "bob", false).await;
        let body = body.replace(r#""name":"Ann""#, r#""name":"""#);
        let response = make_request(
            app(state),
            Method::POST,
            "/auth/onboarding",
            &body,
            Some(&token),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json(response).await["missingFields"],
            serde_json::json!(["name"])
        );
    }

    #[tokio::test]
    async fn test_long_name() {
        let (state, _) = state();
        let (_, token) = register(&state, "ann", false).await;
        let name = "A".repeat(60);
        let body = FULL.replace(r#""name":"Ann""#, &format!(r#""name":"{name}""#));

        let response = make_request(
            app(state),
            Method::POST,
            "/auth/onboarding",
            &body,
            Some(&token),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["user"]["name"], name);
    }

    #[tokio::test]
    async fn test_invalid_profile_picture() {
        let (state, _) = state();
        let (_, token) = register(&state, "ann", false).await;
        let body = FULL.replace('}', r#","profilePicture":"not a url"}"#);

        let response = make_request(
            app(state),
            Method::POST,
            "/auth/onboarding",
            &body,
            Some(&token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_requires_session() {
        let (state, _) = state();

        let response =
            make_request(app(state), Method::POST, "/auth/onboarding", FULL, None)
                .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
