//! Descending merge sort used for booking lists.
//!
//! The merge takes from the left run only when its key is strictly greater, so on equal keys the
//! element from the right run is emitted first. Listing screens depend on that exact tie order.

use super::domain::Booking;

/// Sort bookings newest `date_from` first.
pub fn merge_sort_by_date_from_desc(bookings: Vec<Booking>) -> Vec<Booking> {
    merge_sort_desc_by_key(bookings, |booking| booking.date_from)
}

/// Top-down merge sort in descending key order.
pub fn merge_sort_desc_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: PartialOrd,
    F: Fn(&T) -> K + Copy,
{
    if items.len() <= 1 {
        return items;
    }

    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort_desc_by_key(left, key);
    let right = merge_sort_desc_by_key(right, key);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => key(l) > key(r),
            _ => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::domain::{BookingId, BookingStatus, PropertyId, UserId};
    use chrono::NaiveDate;

    fn booking(id: &str, month: u32, day: u32) -> Booking {
        let date = NaiveDate::from_ymd_opt(2024, month, day).expect("valid date");
        Booking {
            id: BookingId(id.to_string()),
            requester: UserId("guest".to_string()),
            property: PropertyId("prop-a".to_string()),
            my_property: PropertyId("prop-b".to_string()),
            date_from: date,
            date_to: date,
            status: BookingStatus::Pending,
        }
    }

    fn ids(bookings: &[Booking]) -> Vec<&str> {
        bookings.iter().map(|b| b.id.0.as_str()).collect()
    }

    #[test]
    fn empty_and_single_inputs_pass_through() {
        assert!(merge_sort_by_date_from_desc(Vec::new()).is_empty());
        let single = merge_sort_by_date_from_desc(vec![booking("only", 1, 1)]);
        assert_eq!(ids(&single), ["only"]);
    }

    #[test]
    fn equal_keys_take_the_right_run_first() {
        let sorted = merge_sort_by_date_from_desc(vec![
            booking("first", 1, 10),
            booking("middle", 1, 5),
            booking("second", 1, 10),
        ]);
        // [first] | [middle, second]; the right half sorts to [second, middle] and the
        // tie between first and second resolves to the right run.
        assert_eq!(ids(&sorted), ["second", "first", "middle"]);
    }

    #[test]
    fn tie_between_halves_of_an_even_split() {
        let sorted = merge_sort_by_date_from_desc(vec![
            booking("a", 3, 1),
            booking("b", 3, 1),
        ]);
        assert_eq!(ids(&sorted), ["b", "a"]);
    }

    #[test]
    fn output_is_non_increasing_and_sorting_again_keeps_the_keys() {
        let input: Vec<Booking> = [(5, 2), (1, 9), (5, 2), (12, 30), (3, 3), (1, 9), (7, 14)]
            .iter()
            .enumerate()
            .map(|(n, (m, d))| booking(&format!("b{n}"), *m, *d))
            .collect();

        let once = merge_sort_by_date_from_desc(input.clone());
        assert_eq!(once.len(), input.len());
        assert!(once.windows(2).all(|w| w[0].date_from >= w[1].date_from));

        let twice = merge_sort_by_date_from_desc(once.clone());
        let keys = |v: &[Booking]| v.iter().map(|b| b.date_from).collect::<Vec<_>>();
        assert_eq!(keys(&twice), keys(&once));
    }

    #[test]
    fn sorts_arbitrary_keys_descending() {
        let sorted = merge_sort_desc_by_key(vec![3, 9, 1, 4, 9, 0], |n| *n);
        assert_eq!(sorted, [9, 9, 4, 3, 1, 0]);
    }
}
