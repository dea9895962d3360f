//! Error handler for tandem.

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::Error as SQLxError;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error("all fields are required")]
    MissingFields(Vec<&'static str>),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing, invalid or expired session")]
    Unauthorized,

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error(transparent)]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("internal server error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServerError {
    /// Create an [`ServerError::Internal`] without source.
    pub fn internal(details: impl Into<String>) -> Self {
        Self::Internal {
            details: details.into(),
            source: None,
        }
    }

    /// Wrap any error into [`ServerError::Internal`].
    pub fn internal_from<E>(details: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            details: details.into(),
            source: Some(Box::new(err)),
        }
    }
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_fields: Option<Vec<&'static str>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// List the fields a client forgot to fill.
    pub fn missing_fields(mut self, fields: &[&'static str]) -> Self {
        self.missing_fields = Some(fields.to_vec());
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(
        self,
    ) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
            missing_fields: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .title("There were validation errors with your request.")
            .details(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            ServerError::Validation(validation_errors) => {
                response.errors(validation_errors)
            },

            ServerError::MissingFields(fields) => response
                .title("All fields are required.")
                .missing_fields(fields),

            ServerError::Axum(err) => response
                .title("Server error during data parsing.")
                .details(&err.body_text()),

            ServerError::Conflict(_) => {
                response.title("Request conflicts with current state.")
            },

            ServerError::NotFound(_) => response
                .title("Resource not found.")
                .status(StatusCode::NOT_FOUND),

            ServerError::Forbidden(_) => response
                .title("Forbidden.")
                .status(StatusCode::FORBIDDEN),

            ServerError::InvalidCredentials => response
                .title("Invalid credentials.")
                .details("Invalid credentials")
                .status(StatusCode::UNAUTHORIZED),

            ServerError::Unauthorized => response
                .title("Missing or invalid session.")
                .status(StatusCode::UNAUTHORIZED),

            ServerError::Sql(err) => {
                tracing::error!(error = %err, "database request failed");
                ResponseError::default()
            },

            ServerError::Crypto(err) => {
                tracing::error!(error = %err, "cryptographic operation failed");
                ResponseError::default()
            },

            ServerError::Token(err) => {
                tracing::error!(error = %err, "token operation failed");
                ResponseError::default()
            },

            ServerError::Internal { details, source } => {
                tracing::error!(error = ?source, %details, "server returned 500 status");
                ResponseError::default()
            },
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
                "errors": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: ServerError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_missing_fields_are_listed() {
        let (status, body) =
            body_of(ServerError::MissingFields(vec!["name", "country"])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["missingFields"], serde_json::json!(["name", "country"]));
    }

    #[tokio::test]
    async fn test_taxonomy_status_codes() {
        assert_eq!(
            body_of(ServerError::Conflict("dup")).await.0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            body_of(ServerError::NotFound("gone")).await.0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            body_of(ServerError::Forbidden("nope")).await.0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            body_of(ServerError::Unauthorized).await.0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            body_of(ServerError::InvalidCredentials).await.0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_internal_details_stay_private() {
        let (status, body) =
            body_of(ServerError::internal("secret connection string")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("secret connection string"));
        assert!(body.get("missingFields").is_none());
    }
}
