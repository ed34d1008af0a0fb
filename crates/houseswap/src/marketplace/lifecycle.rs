//! Rules of the booking state machine, kept free of storage so they can be checked directly.
//!
//! `pending -> accepted | declined`. Both outcomes are terminal. The target property's owner
//! decides; the expiry sweep declines requests that are about to start undecided.

use chrono::{Days, NaiveDate};

use super::domain::{
    limit_text, Booking, BookingStatus, DateRange, Decision, Property, PropertyId, UserId,
    MAX_REVIEW_TEXT, MAX_STARS,
};
use super::error::{MarketplaceError, ValidationError};

/// Check a new swap request against the two properties involved.
pub fn check_request(
    requester: &UserId,
    target: &Property,
    offered: &Property,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<DateRange, MarketplaceError> {
    if &offered.owner != requester {
        return Err(MarketplaceError::Unauthorized(format!(
            "property '{}' is not owned by '{}'",
            offered.id, requester
        )));
    }
    if target.id == offered.id {
        return Err(ValidationError::SameProperty.into());
    }
    if &target.owner == requester {
        return Err(ValidationError::OwnProperty.into());
    }
    Ok(DateRange::new(date_from, date_to)?)
}

/// Status a decision moves the booking to, once the actor and current state allow it.
pub fn check_decision(
    booking: &Booking,
    target: &Property,
    actor: &UserId,
    decision: Decision,
) -> Result<BookingStatus, MarketplaceError> {
    if &target.owner != actor {
        return Err(MarketplaceError::Unauthorized(format!(
            "only the owner of '{}' may decide booking '{}'",
            target.id, booking.id
        )));
    }
    let next = decision.status();
    if !booking.status.can_transition_to(next) {
        return Err(MarketplaceError::InvalidTransition {
            booking: booking.id.clone(),
            from: booking.status,
            to: next,
        });
    }
    Ok(next)
}

/// Last start date the sweep declines when run on `today`.
pub fn expiry_cutoff(today: NaiveDate, expiry_days: u32) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(expiry_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Still pending and starting on or before the cutoff.
pub fn is_expired(booking: &Booking, cutoff: NaiveDate) -> bool {
    booking.status == BookingStatus::Pending && booking.date_from <= cutoff
}

/// The property a reviewer is allowed to review: the one belonging to the other party.
pub fn reviewed_property(
    booking: &Booking,
    target: &Property,
    offered: &Property,
    reviewer: &UserId,
) -> Result<PropertyId, MarketplaceError> {
    if &target.owner == reviewer {
        Ok(offered.id.clone())
    } else if &offered.owner == reviewer {
        Ok(target.id.clone())
    } else {
        Err(MarketplaceError::Unauthorized(format!(
            "'{}' is not a party to booking '{}'",
            reviewer, booking.id
        )))
    }
}

pub fn check_review(text: &str, stars: u8) -> Result<(), ValidationError> {
    if stars > MAX_STARS {
        return Err(ValidationError::StarsOutOfRange {
            stars,
            max: MAX_STARS,
        });
    }
    limit_text("text", text, MAX_REVIEW_TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::domain::{BookingId, PropertyListing};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).expect("valid date")
    }

    fn property(id: &str, owner: &str) -> Property {
        Property {
            id: PropertyId(id.to_string()),
            owner: UserId(owner.to_string()),
            listing: PropertyListing {
                country: "IL".to_string(),
                city: "Jerusalem".to_string(),
                postcode: "9103401".to_string(),
                address: "12 Agron".to_string(),
                no_of_rooms: 3,
                estimated_value: 2_400_000.0,
                property_type: "Flat".to_string(),
                pet_friendly: true,
                proximity_to_public_transport: 2,
                succah: true,
                passover_kitchen: true,
                max_occupancy: 5,
                smoking_allowed: false,
                home_description: "Balcony facing the old city".to_string(),
                image_keys: Vec::new(),
            },
        }
    }

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: BookingId("bkg-1".to_string()),
            requester: UserId("guest".to_string()),
            property: PropertyId("target".to_string()),
            my_property: PropertyId("offered".to_string()),
            date_from: date(10),
            date_to: date(17),
            status,
        }
    }

    #[test]
    fn request_requires_owning_the_offered_property() {
        let target = property("target", "host");
        let offered = property("offered", "someone-else");
        let err = check_request(&UserId("guest".to_string()), &target, &offered, date(1), date(2))
            .expect_err("offered property is not ours");
        assert!(matches!(err, MarketplaceError::Unauthorized(_)));
    }

    #[test]
    fn request_rejects_self_swaps_and_inverted_ranges() {
        let guest = UserId("guest".to_string());
        let mine = property("offered", "guest");
        let other_mine = property("second", "guest");
        let theirs = property("target", "host");

        assert!(matches!(
            check_request(&guest, &mine, &mine, date(1), date(2)),
            Err(MarketplaceError::Validation(ValidationError::SameProperty))
        ));
        assert!(matches!(
            check_request(&guest, &other_mine, &mine, date(1), date(2)),
            Err(MarketplaceError::Validation(ValidationError::OwnProperty))
        ));
        assert!(matches!(
            check_request(&guest, &theirs, &mine, date(5), date(4)),
            Err(MarketplaceError::Validation(ValidationError::InvalidDateRange { .. }))
        ));
        let range = check_request(&guest, &theirs, &mine, date(4), date(4)).expect("same day ok");
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn only_the_target_owner_decides_pending_bookings() {
        let target = property("target", "host");
        let pending = booking(BookingStatus::Pending);

        assert!(matches!(
            check_decision(&pending, &target, &UserId("guest".to_string()), Decision::Accept),
            Err(MarketplaceError::Unauthorized(_))
        ));
        assert_eq!(
            check_decision(&pending, &target, &UserId("host".to_string()), Decision::Decline)
                .expect("owner may decline"),
            BookingStatus::Declined
        );

        let accepted = booking(BookingStatus::Accepted);
        match check_decision(&accepted, &target, &UserId("host".to_string()), Decision::Decline) {
            Err(MarketplaceError::InvalidTransition { from, to, .. }) => {
                assert_eq!(from, BookingStatus::Accepted);
                assert_eq!(to, BookingStatus::Declined);
            }
            other => panic!("expected invalid transition, got {other:?}"),
        }
    }

    #[test]
    fn expiry_covers_today_and_tomorrow_only() {
        let today = date(10);
        let cutoff = expiry_cutoff(today, 1);
        let mut starts_today = booking(BookingStatus::Pending);
        starts_today.date_from = today;
        let mut starts_tomorrow = starts_today.clone();
        starts_tomorrow.date_from = date(11);
        let mut starts_later = starts_today.clone();
        starts_later.date_from = date(13);
        let mut accepted_today = starts_today.clone();
        accepted_today.status = BookingStatus::Accepted;

        assert!(is_expired(&starts_today, cutoff));
        assert!(is_expired(&starts_tomorrow, cutoff));
        assert!(!is_expired(&starts_later, cutoff));
        assert!(!is_expired(&accepted_today, cutoff));
    }

    #[test]
    fn reviewers_review_the_other_party() {
        let target = property("target", "host");
        let offered = property("offered", "guest");
        let b = booking(BookingStatus::Pending);

        let by_host = reviewed_property(&b, &target, &offered, &UserId("host".to_string()));
        assert_eq!(by_host.expect("host reviews"), offered.id);
        let by_guest = reviewed_property(&b, &target, &offered, &UserId("guest".to_string()));
        assert_eq!(by_guest.expect("guest reviews"), target.id);
        assert!(matches!(
            reviewed_property(&b, &target, &offered, &UserId("stranger".to_string())),
            Err(MarketplaceError::Unauthorized(_))
        ));
    }

    #[test]
    fn review_content_limits() {
        assert!(check_review("Lovely stay", 5).is_ok());
        assert!(check_review("", 0).is_ok());
        assert_eq!(
            check_review("ok", 6),
            Err(ValidationError::StarsOutOfRange { stars: 6, max: 5 })
        );
        assert!(matches!(
            check_review(&"x".repeat(101), 3),
            Err(ValidationError::FieldTooLong { field: "text", .. })
        ));
    }
}
