//! Public instance information and metrics.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::AppState;

/// Structured configuration.
#[derive(Serialize)]
pub struct Status {
    version: String,
    name: String,
}

/// Public server status (configuration).
pub async fn status(State(state): State<AppState>) -> Json<Status> {
    let name = if state.config.name.is_empty() {
        env!("CARGO_CRATE_NAME").to_owned()
    } else {
        state.config.name.clone()
    };

    Json(Status {
        version: env!("CARGO_PKG_VERSION").into(),
        name,
    })
}

/// Prometheus exposition of recorded metrics.
pub async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::default()),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};

    use crate::router::tests::{json, state};
    use crate::{app, make_request};

    #[tokio::test]
    async fn test_status() {
        let (state, _) = state();

        let response =
            make_request(app(state), Method::GET, "/status.json", "", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["name"], "tandem");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let (state, _) = state();

        let response = make_request(app(state), Method::GET, "/metrics", "", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
