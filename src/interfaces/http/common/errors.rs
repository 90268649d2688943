//! Domain error → HTTP status mapping

use axum::http::StatusCode;
use axum::Json;
use tracing::error;

use super::ApiResponse;
use crate::shared::errors::DomainError;

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn status_for(e: &DomainError) -> StatusCode {
    match e {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a domain error into an error envelope.
///
/// Database failures are logged and reported without internal detail.
pub fn domain_error(e: DomainError) -> ApiError {
    let status = status_for(&e);
    let message = match &e {
        DomainError::NotFound { entity, value, .. } => format!("{} '{}' not found", entity, value),
        DomainError::Validation(msg)
        | DomainError::Conflict(msg)
        | DomainError::Unauthorized(msg)
        | DomainError::Forbidden(msg) => msg.clone(),
        DomainError::Database(msg) => {
            error!(error = %msg, "Database error while handling request");
            "Internal server error".to_string()
        }
    };
    (status, Json(ApiResponse::error(message)))
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            status_for(&DomainError::not_found("Store", 1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&DomainError::Conflict("dup".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&DomainError::Forbidden("no".into())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn database_details_are_hidden() {
        let (status, Json(body)) = domain_error(DomainError::Database("disk I/O error".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.as_deref(), Some("Internal server error"));

        let (_, Json(body)) = domain_error(DomainError::not_found("Item", 7));
        assert_eq!(body.error.as_deref(), Some("Item '7' not found"));
    }
}
