//! Unified error codes for the review engine
//!
//! This module defines all error codes used across the server and its
//! clients. Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Rating errors
//! - 5xxx: Review errors
//! - 6xxx: Booking/lifecycle errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 6,
    /// Value out of range
    ValueOutOfRange = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1002,
    /// Token is invalid
    TokenInvalid = 1003,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 4xxx: Rating ====================
    /// Rating not found for this target/rater pair
    RatingNotFound = 4001,
    /// Rating score outside the 1-5 range
    RatingOutOfRange = 4002,

    // ==================== 5xxx: Review ====================
    /// Review not found
    ReviewNotFound = 5001,
    /// One or more category scores are missing
    IncompleteCategoryRating = 5002,
    /// Booking already has a review
    AlreadyReviewed = 5003,
    /// Caller is not eligible to review this booking
    NotEligible = 5004,
    /// Review belongs to a different rater
    ReviewNotOwned = 5005,

    // ==================== 6xxx: Booking/Lifecycle ====================
    /// Booking completion record not found
    BookingNotFound = 6001,
    /// Booking completion record already exists
    BookingExists = 6002,
    /// Transition not legal from the current lifecycle status
    InvalidTransition = 6003,
    /// Caller is not the guide on this booking
    NotBookingGuide = 6004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Concurrent writers exhausted the transaction retry budget
    ConcurrencyConflict = 9101,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Rating
            ErrorCode::RatingNotFound => "Rating not found",
            ErrorCode::RatingOutOfRange => "Rating must be between 1 and 5",

            // Review
            ErrorCode::ReviewNotFound => "Review not found",
            ErrorCode::IncompleteCategoryRating => "All category scores are required",
            ErrorCode::AlreadyReviewed => "This booking has already been reviewed",
            ErrorCode::NotEligible => "Booking is not eligible for review",
            ErrorCode::ReviewNotOwned => "Review belongs to a different user",

            // Booking/Lifecycle
            ErrorCode::BookingNotFound => "Booking completion not found",
            ErrorCode::BookingExists => "Booking completion already recorded",
            ErrorCode::InvalidTransition => "Transition not allowed from the current status",
            ErrorCode::NotBookingGuide => "Only the booking's guide may confirm delivery",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::ConcurrencyConflict => "Concurrent update conflict, please retry",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::RequiredField),
            7 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::TokenExpired),
            1003 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Rating
            4001 => Ok(ErrorCode::RatingNotFound),
            4002 => Ok(ErrorCode::RatingOutOfRange),

            // Review
            5001 => Ok(ErrorCode::ReviewNotFound),
            5002 => Ok(ErrorCode::IncompleteCategoryRating),
            5003 => Ok(ErrorCode::AlreadyReviewed),
            5004 => Ok(ErrorCode::NotEligible),
            5005 => Ok(ErrorCode::ReviewNotOwned),

            // Booking/Lifecycle
            6001 => Ok(ErrorCode::BookingNotFound),
            6002 => Ok(ErrorCode::BookingExists),
            6003 => Ok(ErrorCode::InvalidTransition),
            6004 => Ok(ErrorCode::NotBookingGuide),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9101 => Ok(ErrorCode::ConcurrencyConflict),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::PermissionDenied.code(), 2001);
        assert_eq!(ErrorCode::RatingNotFound.code(), 4001);
        assert_eq!(ErrorCode::IncompleteCategoryRating.code(), 5002);
        assert_eq!(ErrorCode::AlreadyReviewed.code(), 5003);
        assert_eq!(ErrorCode::NotEligible.code(), 5004);
        assert_eq!(ErrorCode::BookingNotFound.code(), 6001);
        assert_eq!(ErrorCode::InvalidTransition.code(), 6003);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
        assert_eq!(ErrorCode::ConcurrencyConflict.code(), 9101);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
        assert!(!ErrorCode::NotEligible.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(1001), Ok(ErrorCode::NotAuthenticated));
        assert_eq!(ErrorCode::try_from(5003), Ok(ErrorCode::AlreadyReviewed));
        assert_eq!(ErrorCode::try_from(9101), Ok(ErrorCode::ConcurrencyConflict));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let codes = [
            ErrorCode::Success,
            ErrorCode::NotAuthenticated,
            ErrorCode::NotEligible,
            ErrorCode::InvalidTransition,
            ErrorCode::ConcurrencyConflict,
        ];
        for code in codes {
            let json = serde_json::to_string(&code).unwrap();
            let parsed: ErrorCode = serde_json::from_str(&json).unwrap();
            assert_eq!(code, parsed);
        }
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::NotFound), "3");
        assert_eq!(format!("{}", ErrorCode::AlreadyReviewed), "5003");
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::NotFound.message(), "Resource not found");
        assert_eq!(
            ErrorCode::NotBookingGuide.message(),
            "Only the booking's guide may confirm delivery"
        );
    }
}
