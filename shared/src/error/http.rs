//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::RatingNotFound
            | Self::ReviewNotFound
            | Self::BookingNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::BookingExists
            | Self::AlreadyReviewed
            | Self::ConcurrencyConflict => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::PermissionDenied | Self::NotBookingGuide | Self::ReviewNotOwned => {
                StatusCode::FORBIDDEN
            }

            // 422 Unprocessable Entity (business-rule rejections the UI explains)
            Self::NotEligible | Self::InvalidTransition => StatusCode::UNPROCESSABLE_ENTITY,

            // 400 Bad Request
            Self::Unknown
            | Self::ValidationFailed
            | Self::InvalidRequest
            | Self::RequiredField
            | Self::ValueOutOfRange
            | Self::RatingOutOfRange
            | Self::IncompleteCategoryRating => StatusCode::BAD_REQUEST,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorCode::NotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::NotAuthenticated.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ErrorCode::NotBookingGuide.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::NotEligible.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::AlreadyReviewed.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::ConcurrencyConflict.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::RatingOutOfRange.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
