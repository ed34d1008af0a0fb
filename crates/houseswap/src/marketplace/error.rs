use chrono::NaiveDate;

use super::domain::{BookingId, BookingStatus};
use super::repository::RepositoryError;

/// Input that fails marketplace rules before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("date range starts on {start} after it ends on {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("'{value}' is not a YYYY-MM-DD date")]
    InvalidDate { value: String },
    #[error("a property cannot be swapped with itself")]
    SameProperty,
    #[error("you cannot request a swap for your own property")]
    OwnProperty,
    #[error("stars must be between 0 and {max}, got {stars}")]
    StarsOutOfRange { stars: u8, max: u8 },
    #[error("{field} is limited to {max} characters")]
    FieldTooLong { field: &'static str, max: usize },
    #[error("{field} must not be blank")]
    BlankField { field: &'static str },
    #[error("'{value}' is not an ISO 3166 alpha-2 country code")]
    InvalidCountry { value: String },
    #[error("{field} has an invalid value")]
    InvalidValue { field: &'static str },
}

/// Error raised by the swap service.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("booking '{booking}' is {from} and cannot become {to}")]
    InvalidTransition {
        booking: BookingId,
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl MarketplaceError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
