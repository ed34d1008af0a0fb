use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Booking, BookingId, BookingStatus, KashrutAuthority, KashrutId, Profile, Property, PropertyId,
    Review, UserId,
};
use super::repository::{MarketplaceRepository, RepositoryError};

#[derive(Default)]
struct MarketplaceState {
    properties: Vec<Property>,
    bookings: Vec<Booking>,
    reviews: Vec<Review>,
    profiles: HashMap<UserId, Profile>,
    kashrut: Vec<KashrutAuthority>,
}

/// Process-local store used by the service binary, the demo, and tests.
#[derive(Default, Clone)]
pub struct InMemoryMarketplace {
    state: Arc<Mutex<MarketplaceState>>,
}

impl InMemoryMarketplace {
    fn lock(&self) -> Result<MutexGuard<'_, MarketplaceState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("marketplace store poisoned".to_string()))
    }
}

impl MarketplaceRepository for InMemoryMarketplace {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.properties.iter().any(|p| p.id == property.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.properties.push(property.clone());
        Ok(property)
    }

    fn fetch_property(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.properties.iter().find(|p| &p.id == id).cloned())
    }

    fn properties(&self) -> Result<Vec<Property>, RepositoryError> {
        Ok(self.lock()?.properties.clone())
    }

    fn insert_booking(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.bookings.iter().any(|b| b.id == booking.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.bookings.push(booking.clone());
        Ok(booking)
    }

    fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.bookings.iter().find(|b| &b.id == id).cloned())
    }

    fn bookings(&self) -> Result<Vec<Booking>, RepositoryError> {
        Ok(self.lock()?.bookings.clone())
    }

    fn transition_booking(
        &self,
        id: &BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, RepositoryError> {
        let mut guard = self.lock()?;
        let booking = guard
            .bookings
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or(RepositoryError::NotFound)?;
        if booking.status != expected {
            return Err(RepositoryError::StatusMismatch {
                current: booking.status,
            });
        }
        booking.status = next;
        Ok(booking.clone())
    }

    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        let mut guard = self.lock()?;
        let duplicate = guard.reviews.iter().any(|r| {
            r.id == review.id || (r.booking == review.booking && r.reviewer == review.reviewer)
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        guard.reviews.push(review.clone());
        Ok(review)
    }

    fn reviews_for_property(&self, id: &PropertyId) -> Result<Vec<Review>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .reviews
            .iter()
            .filter(|r| &r.property_reviewed == id)
            .cloned()
            .collect())
    }

    fn insert_profile(&self, profile: Profile) -> Result<Profile, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.profiles.contains_key(&profile.user) {
            return Err(RepositoryError::Conflict);
        }
        guard.profiles.insert(profile.user.clone(), profile.clone());
        Ok(profile)
    }

    fn update_profile(&self, profile: Profile) -> Result<Profile, RepositoryError> {
        let mut guard = self.lock()?;
        match guard.profiles.get_mut(&profile.user) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(profile)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_profile(&self, user: &UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.lock()?.profiles.get(user).cloned())
    }

    fn profile_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.profiles.len())
    }

    fn insert_kashrut(
        &self,
        authority: KashrutAuthority,
    ) -> Result<KashrutAuthority, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.kashrut.iter().any(|k| k.id == authority.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.kashrut.push(authority.clone());
        Ok(authority)
    }

    fn fetch_kashrut(&self, id: &KashrutId) -> Result<Option<KashrutAuthority>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.kashrut.iter().find(|k| &k.id == id).cloned())
    }

    fn kashrut_authorities(&self) -> Result<Vec<KashrutAuthority>, RepositoryError> {
        let mut authorities = self.lock()?.kashrut.clone();
        authorities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(authorities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn booking(id: &str, status: BookingStatus) -> Booking {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
        Booking {
            id: BookingId(id.to_string()),
            requester: UserId("rivka".to_string()),
            property: PropertyId("prop-a".to_string()),
            my_property: PropertyId("prop-b".to_string()),
            date_from: day,
            date_to: day,
            status,
        }
    }

    #[test]
    fn transition_only_applies_from_expected_status() {
        let store = InMemoryMarketplace::default();
        store
            .insert_booking(booking("bkg-1", BookingStatus::Pending))
            .expect("insert");

        let accepted = store
            .transition_booking(
                &BookingId("bkg-1".to_string()),
                BookingStatus::Pending,
                BookingStatus::Accepted,
            )
            .expect("first decision wins");
        assert_eq!(accepted.status, BookingStatus::Accepted);

        let second = store.transition_booking(
            &BookingId("bkg-1".to_string()),
            BookingStatus::Pending,
            BookingStatus::Declined,
        );
        assert_eq!(
            second,
            Err(RepositoryError::StatusMismatch {
                current: BookingStatus::Accepted
            })
        );
    }

    #[test]
    fn transition_reports_missing_booking() {
        let store = InMemoryMarketplace::default();
        let result = store.transition_booking(
            &BookingId("nope".to_string()),
            BookingStatus::Pending,
            BookingStatus::Accepted,
        );
        assert_eq!(result, Err(RepositoryError::NotFound));
    }

    #[test]
    fn kashrut_authorities_are_alphabetical() {
        let store = InMemoryMarketplace::default();
        for (id, name) in [("k1", "Manchester Beth Din"), ("k2", "Federation"), ("k3", "KLBD")] {
            store
                .insert_kashrut(KashrutAuthority {
                    id: KashrutId(id.to_string()),
                    name: name.to_string(),
                })
                .expect("insert");
        }
        let names: Vec<_> = store
            .kashrut_authorities()
            .expect("list")
            .into_iter()
            .map(|k| k.name)
            .collect();
        assert_eq!(names, ["Federation", "KLBD", "Manchester Beth Din"]);
    }
}
