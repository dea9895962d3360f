//! Tandem is the API behind a language exchange community: learners sign up,
//! describe the languages they speak and learn, befriend each other and chat.

#![forbid(unsafe_code)]
pub mod chat;
pub mod config;
mod crypto;
mod database;
pub mod error;
mod friend;
mod middleware;
mod router;
mod session;
pub mod telemetry;
mod token;
mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use chat::ChatProvider;
use config::Configuration;
use crypto::PasswordManager;
use database::Database;
use friend::FriendService;
use token::TokenManager;
use user::UserService;

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: &str,
    token: Option<&str>,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request =
            request.header(header::COOKIE, format!("{}={token}", session::COOKIE_NAME));
    }

    app.oneshot(request.body(axum::body::Body::from(body.to_owned())).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Configuration>,
    pub users: UserService,
    pub friends: FriendService,
    pub token: TokenManager,
    pub chat: Arc<dyn ChatProvider>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire services on top of `db`.
    pub(crate) fn new(
        config: Arc<Configuration>,
        db: Database,
        crypto: PasswordManager,
        token: TokenManager,
        chat: Arc<dyn ChatProvider>,
    ) -> Self {
        let users = UserService::new(db.users.clone(), Arc::new(crypto));
        let friends = FriendService::new(db.users.clone(), db.requests.clone());

        Self {
            config,
            users,
            friends,
            token,
            chat,
            metrics: None,
        }
    }

    /// Expose recorded metrics on `GET /metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

fn cors(client_url: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    match client_url.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(err)) => {
            tracing::warn!(error = %err, "`client_url` is not a valid origin");
            layer
        },
        None => layer,
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([
            header::AUTHORIZATION,
            header::COOKIE,
            header::SET_COOKIE,
        ]))
        // The client sends its session cookie cross-origin.
        .layer(cors(state.config.client_url.as_deref()));

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        // `GET /metrics` goes to `metrics`.
        .route("/metrics", get(router::status::metrics))
        .merge(router::auth::router(state.clone()))
        .merge(router::users::router(state.clone()))
        .merge(router::chat::router(state.clone()))
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file, let it in memory.
    let path = std::env::var("CONFIG_PATH").unwrap_or_default();
    let config = Configuration::default()
        .path(path.into())
        .read()?
        .with_env();

    let db = match (std::env::var("DATABASE_URL"), &config.postgres) {
        (Ok(url), _) => {
            let pool = config
                .postgres
                .as_ref()
                .and_then(|pg| pg.pool_size)
                .unwrap_or(database::DEFAULT_POOL_SIZE);
            Database::connect(&url, pool).await?
        },
        (Err(_), Some(pg)) => {
            Database::new(
                &pg.address,
                pg.username
                    .as_deref()
                    .unwrap_or(database::DEFAULT_CREDENTIALS),
                pg.password
                    .as_deref()
                    .unwrap_or(database::DEFAULT_CREDENTIALS),
                pg.database
                    .as_deref()
                    .unwrap_or(database::DEFAULT_DATABASE_NAME),
                pg.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE),
            )
            .await?
        },
        (Err(_), None) => {
            tracing::warn!(
                "missing `postgres` entry on `config.yaml` file, data is kept in memory"
            );
            Database::memory()
        },
    };

    let crypto = PasswordManager::new(config.argon2.clone())?;

    // handle jwt.
    let Some(token) = &config.token else {
        return Err("missing `token` entry on `config.yaml` file or `JWT_SECRET`".into());
    };
    let issuer = if config.name.is_empty() {
        env!("CARGO_CRATE_NAME")
    } else {
        &config.name
    };
    let lifetime = token
        .expires_in
        .filter(|seconds| *seconds > 0)
        .unwrap_or(token::EXPIRATION_TIME);
    let token = TokenManager::new(issuer, &token.secret)?.expires_in(lifetime);

    // handle chat provider.
    let chat: Arc<dyn ChatProvider> = match &config.chat {
        Some(cfg) => Arc::new(chat::StreamChat::new(cfg)?),
        None => {
            tracing::warn!("missing `chat` entry on `config.yaml` file, chat is disabled");
            Arc::new(chat::Disabled)
        },
    };

    Ok(AppState::new(Arc::new(config), db, crypto, token, chat))
}
