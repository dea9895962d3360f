use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use super::AuthResponse;
use crate::AppState;
use crate::error::Result;
use crate::session::clear_cookie;

/// Handler to drop the session cookie.
pub async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let cookie = clear_cookie(state.config.secure_cookies())?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::new("Logout successful.", None)),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode, header};

    use crate::router::tests::{json, state};
    use crate::{app, make_request};

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let (state, _) = state();

        let response =
            make_request(app(state), Method::POST, "/auth/logout", "", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("jwt=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert_eq!(json(response).await["success"], true);
    }
}
