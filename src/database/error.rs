use sqlx::error::ErrorKind;
use warp::http::StatusCode;
use warp::reject::Reject;

/// Error surface of the whole SDK. Every action reports one of these kinds;
/// the serving layer maps them onto response codes via [`ApiError::status`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    Database(String),
}

impl ApiError {
    pub fn validation(info: &str) -> Self {
        Self::Validation(info.to_string())
    }

    pub fn not_found(info: &str) -> Self {
        Self::NotFound(info.to_string())
    }

    pub fn conflict(info: &str) -> Self {
        Self::Conflict(info.to_string())
    }

    pub fn permission_denied(info: &str) -> Self {
        Self::PermissionDenied(info.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The pair-uniqueness and self-reference rules are enforced by constraints
/// at the storage layer; losing a race surfaces here as a constraint error,
/// so the classification below is what turns it into a reported conflict
/// instead of a duplicate row.
impl From<sqlx::Error> for ApiError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self::NotFound("Row not found".to_string()),
            sqlx::Error::Database(e) => match e.kind() {
                ErrorKind::UniqueViolation => Self::Conflict(format!("{e}")),
                ErrorKind::ForeignKeyViolation => Self::NotFound(format!("{e}")),
                ErrorKind::CheckViolation => Self::Validation(format!("{e}")),
                _ => Self::Database(format!("{e}")),
            },
            sqlx::Error::PoolTimedOut => Self::Database("Pool timed out".to_string()),
            sqlx::Error::PoolClosed => Self::Database("Pool closed".to_string()),
            e => Self::Database(format!("{e}")),
        }
    }
}

impl Reject for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_by_kind() {
        assert_eq!(
            ApiError::validation("bad field").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::not_found("no such row").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::conflict("duplicate pair").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::permission_denied("not the author").status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn unclassified_errors_stay_internal() {
        let err = ApiError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, ApiError::Database(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
