// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.
//!
//! Business failures carry an [`ErrorKind`] from a fixed catalog; each kind
//! is bound to an HTTP status, a short code and a message. Every error is
//! rendered as the `{success:false, code, msg}` envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Catalog of named business error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // common
    UnexpectedServerError,
    BindingError,
    NumberFormatError,
    JsonProcessingError,
    HttpClientError,
    TimeoutError,
    ResourceNotFound,
    AccessDenied,
    MethodNotAllowed,
    UnsupportedMediaType,

    // auth
    InvalidRefreshToken,
    RefreshTokenExpired,
    PasswordNotMatched,
    UnauthorizedUser,

    // user
    UserNotFound,
    DuplicatedUsername,

    // favorite
    FavoriteNotFound,

    // crew
    CrewNotFound,
    CrewFull,
    CrewAlreadyJoined,
    CrewClosed,
    CrewHostCannotApply,
    CrewPermissionDenied,
    AiServiceError,

    // crew participant
    ParticipantNotFound,

    // report
    ReportNotFound,
    ReportAccessDenied,
    ReportAlreadyProcessed,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        use ErrorKind::*;
        match self {
            UnexpectedServerError => StatusCode::INTERNAL_SERVER_ERROR,
            BindingError | NumberFormatError | JsonProcessingError => StatusCode::BAD_REQUEST,
            HttpClientError => StatusCode::BAD_GATEWAY,
            TimeoutError => StatusCode::REQUEST_TIMEOUT,
            ResourceNotFound => StatusCode::NOT_FOUND,
            AccessDenied => StatusCode::FORBIDDEN,
            MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            InvalidRefreshToken | PasswordNotMatched => StatusCode::NOT_ACCEPTABLE,
            RefreshTokenExpired | UnauthorizedUser => StatusCode::UNAUTHORIZED,
            UserNotFound => StatusCode::NOT_FOUND,
            DuplicatedUsername => StatusCode::CONFLICT,
            FavoriteNotFound => StatusCode::NOT_FOUND,
            CrewNotFound => StatusCode::NOT_FOUND,
            CrewFull => StatusCode::FORBIDDEN,
            CrewAlreadyJoined => StatusCode::CONFLICT,
            CrewClosed | CrewHostCannotApply => StatusCode::BAD_REQUEST,
            CrewPermissionDenied => StatusCode::FORBIDDEN,
            AiServiceError => StatusCode::BAD_GATEWAY,
            ParticipantNotFound => StatusCode::NOT_FOUND,
            ReportNotFound => StatusCode::NOT_FOUND,
            ReportAccessDenied => StatusCode::FORBIDDEN,
            ReportAlreadyProcessed => StatusCode::CONFLICT,
        }
    }

    pub fn code(self) -> &'static str {
        use ErrorKind::*;
        match self {
            UnexpectedServerError => "C001",
            BindingError => "C002",
            NumberFormatError => "C009",
            JsonProcessingError => "C010",
            HttpClientError => "C011",
            TimeoutError => "C012",
            ResourceNotFound => "C013",
            AccessDenied => "C014",
            MethodNotAllowed => "C015",
            UnsupportedMediaType => "C016",
            InvalidRefreshToken => "A001",
            RefreshTokenExpired => "A002",
            PasswordNotMatched => "A003",
            UserNotFound => "U001",
            DuplicatedUsername => "U003",
            UnauthorizedUser => "U005",
            FavoriteNotFound => "F001",
            CrewNotFound => "CR001",
            CrewFull => "CR003",
            CrewAlreadyJoined => "CR004",
            CrewPermissionDenied => "CR007",
            AiServiceError => "CR009",
            CrewClosed => "CR010",
            CrewHostCannotApply => "CR011",
            ParticipantNotFound => "CP001",
            ReportNotFound => "RP001",
            ReportAccessDenied => "RP002",
            ReportAlreadyProcessed => "RP003",
        }
    }

    pub fn message(self) -> &'static str {
        use ErrorKind::*;
        match self {
            UnexpectedServerError => "Unexpected server error",
            BindingError => "Request binding failed",
            NumberFormatError => "Invalid number format",
            JsonProcessingError => "Malformed JSON body",
            HttpClientError => "External API call failed",
            TimeoutError => "Request timed out",
            ResourceNotFound => "Resource not found",
            AccessDenied => "Access denied",
            MethodNotAllowed => "HTTP method not supported",
            UnsupportedMediaType => "Unsupported media type",
            InvalidRefreshToken => "Invalid refresh token",
            RefreshTokenExpired => "Refresh token expired",
            PasswordNotMatched => "Password does not match",
            UnauthorizedUser => "Authentication required",
            UserNotFound => "User not found",
            DuplicatedUsername => "Username already taken",
            FavoriteNotFound => "Favorite not found",
            CrewNotFound => "Crew not found",
            CrewFull => "Crew is at capacity",
            CrewAlreadyJoined => "Already applied to this crew",
            CrewClosed => "Crew recruitment is closed",
            CrewHostCannotApply => "Host cannot apply to own crew",
            CrewPermissionDenied => "No permission for this crew",
            AiServiceError => "Route recommendation service failed",
            ParticipantNotFound => "Participant application not found",
            ReportNotFound => "Report not found",
            ReportAccessDenied => "No permission for this report",
            ReportAlreadyProcessed => "Report has already been processed",
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{}", .0.message())]
    Business(ErrorKind),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ErrorKind> for AppError {
    fn from(kind: ErrorKind) -> Self {
        AppError::Business(kind)
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    code: String,
    msg: String,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Business(kind) => *kind,
            AppError::Database(_) | AppError::Internal(_) => ErrorKind::UnexpectedServerError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Business(_) => {}
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
            }
        }

        let kind = self.kind();
        let body = ErrorResponse {
            success: false,
            code: kind.code().to_string(),
            msg: kind.message().to_string(),
        };

        (kind.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
