//! Identity token transport.
//!
//! Browsers carry the token in the `jwt` cookie, other clients may send it as
//! a `Bearer` authorization.

use axum::http::{HeaderMap, HeaderValue, header};

use crate::error::{Result, ServerError};

pub const COOKIE_NAME: &str = "jwt";
const BEARER: &str = "Bearer ";

fn header_value(cookie: String) -> Result<HeaderValue> {
    HeaderValue::from_str(&cookie)
        .map_err(|err| ServerError::internal_from("invalid cookie", err))
}

/// `Set-Cookie` value storing `token` for `max_age` seconds.
pub fn issue_cookie(token: &str, max_age: u64, secure: bool) -> Result<HeaderValue> {
    let mut cookie = format!(
        "{COOKIE_NAME}={token}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Strict"
    );
    if secure {
        cookie.push_str("; Secure");
    }

    header_value(cookie)
}

/// `Set-Cookie` value removing the session.
pub fn clear_cookie(secure: bool) -> Result<HeaderValue> {
    issue_cookie("", 0, secure)
}

/// Find the identity token of a request, cookie first.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == COOKIE_NAME && !value.is_empty())
        .map(|(_, value)| value.to_owned());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix(BEARER))
            .map(|token| token.trim().to_owned())
            .filter(|token| !token.is_empty())
    })
}
