use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

/// Failures at the price-history provider boundary.
/// Messages are shown to the user verbatim, so keep them readable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by market data provider: {0}")]
    RateLimited(String),

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("malformed market data response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// Only transport-level failures are worth retrying. A rate limit will
    /// not clear within the backoff window and the others are permanent.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Network(_))
    }
}

impl From<reqwest::Error> for FetchError {
    /// The request URL carries the API key, so it is stripped from the message.
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.without_url().to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::MalformedResponse(e.to_string())
    }
}

/// Application-level errors. The payoff engine itself never produces one;
/// everything here comes from configuration, the provider, or request input.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("missing parameter(s) for {strategy}: {fields}")]
    MissingParameter { strategy: String, fields: String },

    #[error("unknown parameter(s) for {strategy}: {fields}")]
    UnknownParameter { strategy: String, fields: String },

    #[error("invalid parameter {field}: {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Fetch(FetchError::SymbolNotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Fetch(FetchError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Fetch(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidSymbol(_)
            | AppError::UnknownStrategy(_)
            | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MissingParameter { .. }
            | AppError::UnknownParameter { .. }
            | AppError::InvalidParameter { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
