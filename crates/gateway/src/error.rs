//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use tutorhub_auth::AuthError;
use tutorhub_courses::CourseServiceError;
use tutorhub_database::{UserError, WaitlistError};
use tutorhub_mailer::MailError;
use utoipa::ToSchema;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Mail delivery failed: {0}")]
    MailFailed(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationFailed(_) => StatusCode::FORBIDDEN,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::MailFailed(_) => StatusCode::BAD_GATEWAY,
            GatewayError::InternalError(_) | GatewayError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn unauthenticated() -> Self {
        GatewayError::AuthenticationFailed("sign in required".to_string())
    }

    pub fn forbidden() -> Self {
        GatewayError::AuthorizationFailed("admin role required".to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "request failed");
        }

        let body = ErrorResponse {
            error: status.as_str().to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<AuthError> for GatewayError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::UserExists => GatewayError::Conflict("Email already registered".to_string()),
            AuthError::InvalidCredentials => {
                GatewayError::AuthenticationFailed("Invalid credentials".to_string())
            }
            AuthError::InvalidInput(msg) => GatewayError::InvalidRequest(msg),
            AuthError::SessionNotFound | AuthError::SessionExpired | AuthError::InvalidSession => {
                GatewayError::AuthenticationFailed(error.to_string())
            }
            AuthError::Database(err) => GatewayError::DatabaseError(err.to_string()),
            AuthError::PasswordHash(_)
            | AuthError::ProfileUnavailable(_)
            | AuthError::InvalidConfig(_) => {
                GatewayError::InternalError(error.to_string())
            }
        }
    }
}

impl From<UserError> for GatewayError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::UserNotFound => GatewayError::NotFound("User not found".to_string()),
            UserError::EmailAlreadyExists
            | UserError::NotPending
            | UserError::StillPending => GatewayError::Conflict(error.to_string()),
            UserError::InvalidRequest(msg) => GatewayError::InvalidRequest(msg),
            UserError::DatabaseError(msg) => GatewayError::DatabaseError(msg),
            UserError::SerializationError(msg) => {
                GatewayError::InternalError(format!("Serialization error: {msg}"))
            }
        }
    }
}

impl From<CourseServiceError> for GatewayError {
    fn from(error: CourseServiceError) -> Self {
        match error {
            CourseServiceError::CourseNotFound | CourseServiceError::FileNotFound => {
                GatewayError::NotFound(error.to_string())
            }
            CourseServiceError::CourseExists => GatewayError::Conflict(error.to_string()),
            CourseServiceError::Forbidden => GatewayError::AuthorizationFailed(error.to_string()),
            CourseServiceError::InvalidInput(msg) => GatewayError::InvalidRequest(msg),
            CourseServiceError::TooLarge { .. } => GatewayError::PayloadTooLarge(error.to_string()),
            CourseServiceError::Storage(_) => GatewayError::InternalError(error.to_string()),
            CourseServiceError::Repository(_) => GatewayError::DatabaseError(error.to_string()),
        }
    }
}

impl From<WaitlistError> for GatewayError {
    fn from(error: WaitlistError) -> Self {
        match error {
            WaitlistError::EntryNotFound => {
                GatewayError::NotFound("Waitlist entry not found".to_string())
            }
            WaitlistError::DatabaseError(msg) => GatewayError::DatabaseError(msg),
        }
    }
}

impl From<MailError> for GatewayError {
    fn from(error: MailError) -> Self {
        GatewayError::MailFailed(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            GatewayError::from(UserError::NotPending).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            GatewayError::from(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GatewayError::from(CourseServiceError::Forbidden).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GatewayError::from(CourseServiceError::TooLarge { limit: 10 }).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            GatewayError::from(MailError::Rejected {
                status: 400,
                body: "bad template".into()
            })
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::from(WaitlistError::EntryNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
