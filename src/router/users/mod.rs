//! Learner discovery and friendship HTTP API. Authorization required.
mod accept_request;
mod friends;
mod recommended;
mod requests;
mod send_request;

use axum::routing::{get, post, put};
use axum::{Router, middleware};
use uuid::Uuid;

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::middleware::authenticate;

/// Parse a path identifier. Malformed ones cannot name anything.
fn parse_id(id: &str, not_found: &'static str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| ServerError::NotFound(not_found))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `GET /users` goes to `recommended`.
        .route("/users", get(recommended::handler))
        // `GET /users/friends` goes to `friends`.
        .route("/users/friends", get(friends::handler))
        // `POST /users/sent-requests/{id}` goes to `send_request`.
        .route("/users/sent-requests/{id}", post(send_request::handler))
        // `PUT /users/accept-request/{id}` goes to `accept_request`.
        .route("/users/accept-request/{id}", put(accept_request::handler))
        .route("/users/friend-requests", get(requests::incoming))
        .route("/users/outgoing-friend-requests", get(requests::outgoing))
        .route_layer(middleware::from_fn_with_state(state, authenticate))
}
