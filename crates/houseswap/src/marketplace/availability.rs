use std::collections::HashSet;

use super::domain::{Booking, BookingStatus, DateRange, Property, PropertyId};

/// Whether `booking` keeps its property off the market for `range`.
///
/// Pending requests block as well as accepted ones; only declined bookings are ignored.
pub fn blocks(booking: &Booking, range: &DateRange) -> bool {
    booking.status != BookingStatus::Declined && range.overlaps(booking.date_from, booking.date_to)
}

/// Properties among `candidates` with no blocking booking over `range`, in input order.
///
/// Without a range the candidates are returned untouched.
pub fn available_properties(
    candidates: Vec<Property>,
    bookings: &[Booking],
    range: Option<&DateRange>,
) -> Vec<Property> {
    let Some(range) = range else {
        return candidates;
    };

    let booked: HashSet<&PropertyId> = bookings
        .iter()
        .filter(|booking| blocks(booking, range))
        .map(|booking| &booking.property)
        .collect();

    candidates
        .into_iter()
        .filter(|property| !booked.contains(&property.id))
        .collect()
}
