use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::domain::JobId;
use super::identity::AuthError;
use super::repository::RepositoryError;
use super::session::GuardRejection;

/// Input rejected before any store call is issued.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be between {min} and {max} (found {found})")]
    OutOfRange {
        field: &'static str,
        min: f32,
        max: f32,
        found: f32,
    },
    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Error raised by the portal services.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error(transparent)]
    Access(#[from] GuardRejection),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("student is not eligible for job {0}")]
    NotEligible(JobId),
    #[error("no company linked to this account")]
    CompanyUnlinked,
    #[error("job {0} does not belong to this company")]
    ForeignJob(JobId),
}

impl PortalError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        PortalError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        if let PortalError::Access(rejection) = &self {
            let status = match rejection {
                GuardRejection::Unauthenticated => StatusCode::UNAUTHORIZED,
                GuardRejection::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                GuardRejection::ProfileMissing | GuardRejection::RoleNotPermitted { .. } => {
                    StatusCode::FORBIDDEN
                }
            };
            let payload = json!({
                "error": rejection.to_string(),
                "redirect": rejection.redirect_to(),
            });
            return (
                status,
                [(header::LOCATION, rejection.redirect_to())],
                Json(payload),
            )
                .into_response();
        }

        let status = match &self {
            PortalError::Access(_) => StatusCode::FORBIDDEN,
            PortalError::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailNotConfirmed | AuthError::ProfileMissing => StatusCode::FORBIDDEN,
                AuthError::AlreadyRegistered => StatusCode::CONFLICT,
                AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            PortalError::Validation(_) => StatusCode::BAD_REQUEST,
            PortalError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            PortalError::Repository(RepositoryError::NotFound) | PortalError::NotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            PortalError::Repository(RepositoryError::Unavailable(err)) => {
                tracing::error!("store unavailable: {err}");
                StatusCode::SERVICE_UNAVAILABLE
            }
            PortalError::NotEligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PortalError::CompanyUnlinked | PortalError::ForeignJob(_) => StatusCode::FORBIDDEN,
        };

        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}
