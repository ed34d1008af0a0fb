use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Stable identity supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KashrutId(pub String);

macro_rules! display_id {
    ($($name:ident),+) => {
        $(impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        })+
    };
}

display_id!(UserId, PropertyId, BookingId, ReviewId, KashrutId);

/// Inclusive calendar range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Both ranges share at least one day.
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        from <= self.end && to >= self.start
    }

    /// Parse optional `YYYY-MM-DD` search bounds. Filtering only applies when both are present.
    pub fn from_search_bounds(
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Option<Self>, ValidationError> {
        let start = start.map(str::trim).filter(|raw| !raw.is_empty());
        let end = end.map(str::trim).filter(|raw| !raw.is_empty());
        match (start, end) {
            (Some(start), Some(end)) => {
                let range = Self::new(parse_date(start)?, parse_date(end)?)?;
                Ok(Some(range))
            }
            _ => Ok(None),
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        value: raw.to_string(),
    })
}

/// Listing details supplied when a property is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyListing {
    pub country: String,
    pub city: String,
    pub postcode: String,
    pub address: String,
    pub no_of_rooms: u32,
    pub estimated_value: f64,
    pub property_type: String,
    pub pet_friendly: bool,
    /// Minutes on foot to the nearest public transport stop.
    pub proximity_to_public_transport: u32,
    pub succah: bool,
    pub passover_kitchen: bool,
    pub max_occupancy: u32,
    pub smoking_allowed: bool,
    pub home_description: String,
    #[serde(default)]
    pub image_keys: Vec<String>,
}

impl PropertyListing {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let country = self.country.trim();
        if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCountry {
                value: self.country.clone(),
            });
        }
        require_text("city", &self.city, 20)?;
        require_text("address", &self.address, 30)?;
        limit_text("postcode", &self.postcode, 20)?;
        limit_text("property_type", &self.property_type, 50)?;
        if !self.estimated_value.is_finite() || self.estimated_value < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "estimated_value",
            });
        }
        Ok(())
    }
}

/// A registered property. The owner is fixed at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub owner: UserId,
    #[serde(flatten)]
    pub listing: PropertyListing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Declined,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Declined => "declined",
        }
    }

    /// Only pending bookings may change status.
    pub const fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Accepted)
                | (BookingStatus::Pending, BookingStatus::Declined)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A swap request: the requester offers `my_property` in exchange for `property`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub requester: UserId,
    pub property: PropertyId,
    pub my_property: PropertyId,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub status: BookingStatus,
}

/// What the requester submits for a new swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub my_property: PropertyId,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

/// Owner's answer to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Decline,
}

impl Decision {
    pub const fn status(self) -> BookingStatus {
        match self {
            Decision::Accept => BookingStatus::Accepted,
            Decision::Decline => BookingStatus::Declined,
        }
    }
}

pub const MAX_STARS: u8 = 5;
pub const MAX_REVIEW_TEXT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub booking: BookingId,
    pub property_reviewed: PropertyId,
    pub reviewer: UserId,
    pub text: String,
    pub stars: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KashrutAuthority {
    pub id: KashrutId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user: UserId,
    pub telno_mobile: String,
    pub rabbi: String,
    pub kashrut: Option<KashrutId>,
}

impl Profile {
    pub fn empty(user: UserId) -> Self {
        Self {
            user,
            telno_mobile: String::new(),
            rabbi: String::new(),
            kashrut: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub telno_mobile: String,
    #[serde(default)]
    pub rabbi: String,
    #[serde(default)]
    pub kashrut: Option<KashrutId>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        limit_text("telno_mobile", &self.telno_mobile, 15)?;
        limit_text("rabbi", &self.rabbi, 100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HomeStats {
    pub num_properties: usize,
    pub num_users: usize,
    pub num_kashrut: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub num_properties: usize,
    pub user_kashrut: Option<KashrutAuthority>,
}

fn require_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { field });
    }
    limit_text(field, value, max)
}

pub(crate) fn limit_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::FieldTooLong { field, max });
    }
    Ok(())
}
