use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Notification relay failures. None of these are fatal to the caller.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("unknown event kind `{0}`")]
    UnknownKind(String),
    #[error("malformed event: {0}")]
    Decode(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("relay not connected")]
    NotConnected,
    #[error("relay channel closed")]
    Closed,
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Failures of the contract-facing input checks and of submitted transactions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EscrowError {
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error("Wallet not connected")]
    WalletNotConnected,
    #[error("{0}")]
    Transaction(crate::escrow::TxFailure),
}

/// Errors returned by the relay server's HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
    #[error("No database configured")]
    DatabaseUnavailable,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::InvalidEvent(_) => (StatusCode::BAD_REQUEST, "Invalid event"),
            ApiError::DatabaseUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "Event history unavailable")
            }
            ApiError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
        };

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string()
        }));

        (status, body).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(error: RelayError) -> Self {
        match error {
            RelayError::Database(e) => ApiError::DatabaseError(e.to_string()),
            other => ApiError::InvalidEvent(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::DatabaseError(error.to_string())
    }
}
