// ABOUTME: Centralized error taxonomy for the storefront workflows and HTTP layer
// ABOUTME: Maps workflow failures to status codes without leaking backend details to clients

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Why the authorization gate refused an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenReason {
    InsufficientRole,
    NotOwner,
    ImmutableSuperAdmin,
    AccountBlocked,
    UnknownAction,
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ForbiddenReason::InsufficientRole => "your role does not allow this action",
            ForbiddenReason::NotOwner => "the resource belongs to another account",
            ForbiddenReason::ImmutableSuperAdmin => "a super admin cannot be modified",
            ForbiddenReason::AccountBlocked => "this account is blocked",
            ForbiddenReason::UnknownAction => "unknown action",
        };
        f.write_str(text)
    }
}

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotAuthenticated,
    InvalidCredentials,
    Forbidden(ForbiddenReason),
    NotFound(String),
    Conflict(String),
    InvalidTransition { from: String, to: String },
    UploadFailed(String),
    PersistenceFailed(String),
    BackendUnavailable(String),
}

impl AppError {
    /// Transient collaborator failures are safe to retry; everything else needs
    /// different input or a different role.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::UploadFailed(_)
                | AppError::PersistenceFailed(_)
                | AppError::BackendUnavailable(_)
        )
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotAuthenticated => "not_authenticated",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::UploadFailed(_) => "upload_failed",
            AppError::PersistenceFailed(_) => "persistence_failed",
            AppError::BackendUnavailable(_) => "backend_unavailable",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotAuthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::PersistenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotAuthenticated => write!(f, "Not authenticated"),
            AppError::InvalidCredentials => write!(f, "Invalid email or password"),
            AppError::Forbidden(reason) => write!(f, "Forbidden: {}", reason),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InvalidTransition { from, to } => {
                write!(f, "Invalid transition from {} to {}", from, to)
            }
            AppError::UploadFailed(msg) => write!(f, "Upload failed: {}", msg),
            AppError::PersistenceFailed(msg) => write!(f, "Persistence failed: {}", msg),
            AppError::BackendUnavailable(msg) => write!(f, "Backend unavailable: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Validation(msg) | AppError::Conflict(msg) => {
                tracing::warn!("Rejected request: {}", self);
                msg.clone()
            }
            AppError::NotAuthenticated | AppError::InvalidCredentials => {
                tracing::warn!("Unauthenticated request: {}", self);
                self.to_string()
            }
            AppError::Forbidden(reason) => {
                tracing::warn!(reason = ?reason, "Forbidden request");
                reason.to_string()
            }
            AppError::NotFound(msg) => {
                tracing::info!("Resource not found: {}", msg);
                "Resource not found".to_string()
            }
            AppError::InvalidTransition { .. } => {
                tracing::warn!("{}", self);
                self.to_string()
            }
            AppError::UploadFailed(_) => {
                tracing::error!("{}", self);
                "Payment proof upload failed, please try again".to_string()
            }
            AppError::PersistenceFailed(_) => {
                tracing::error!("{}", self);
                "Could not save your request, please resubmit".to_string()
            }
            AppError::BackendUnavailable(_) => {
                tracing::error!("{}", self);
                "Service temporarily unavailable".to_string()
            }
        };

        let status = self.status();
        let body = Json(json!({
            "error": self.kind(),
            "message": message,
            "retryable": self.is_retryable(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

// Conversion implementations
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::BackendUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(AppError::UploadFailed("disk".into()).is_retryable());
        assert!(AppError::PersistenceFailed("insert".into()).is_retryable());
        assert!(AppError::BackendUnavailable("db".into()).is_retryable());
        assert!(!AppError::Forbidden(ForbiddenReason::ImmutableSuperAdmin).is_retryable());
        assert!(
            !AppError::InvalidTransition {
                from: "active".into(),
                to: "rejected".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(AppError::NotAuthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden(ForbiddenReason::NotOwner).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Validation("missing domain".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: "rejected".into(),
                to: "active".into()
            }
            .status(),
            StatusCode::CONFLICT
        );
    }
}
