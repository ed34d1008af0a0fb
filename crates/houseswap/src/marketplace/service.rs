use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::availability::available_properties;
use super::domain::{
    Booking, BookingId, BookingRequest, BookingStatus, Dashboard, DateRange, Decision, HomeStats,
    KashrutAuthority, KashrutId, Profile, ProfileUpdate, Property, PropertyId, PropertyListing,
    Review, ReviewId, UserId,
};
use super::error::{MarketplaceError, ValidationError};
use super::lifecycle;
use super::ordering::merge_sort_by_date_from_desc;
use super::repository::{MarketplaceRepository, RepositoryError};
use crate::config::MarketplaceConfig;

static PROPERTY_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static REVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static KASHRUT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id(sequence: &AtomicU64, prefix: &str) -> String {
    let id = sequence.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

/// Service composing the repository with the availability, lifecycle, and ordering rules.
pub struct SwapService<R> {
    repository: Arc<R>,
    config: MarketplaceConfig,
}

impl<R> SwapService<R>
where
    R: MarketplaceRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: MarketplaceConfig) -> Self {
        Self { repository, config }
    }

    /// Create the empty profile that accompanies a newly registered user.
    pub fn register_user(&self, user: &UserId) -> Result<Profile, MarketplaceError> {
        let profile = self.repository.insert_profile(Profile::empty(user.clone()))?;
        info!(user = %user, "user registered");
        Ok(profile)
    }

    pub fn update_profile(
        &self,
        user: &UserId,
        update: ProfileUpdate,
    ) -> Result<Profile, MarketplaceError> {
        update.validate()?;
        if let Some(kashrut) = &update.kashrut {
            self.kashrut(kashrut)?;
        }
        let profile = Profile {
            user: user.clone(),
            telno_mobile: update.telno_mobile,
            rabbi: update.rabbi,
            kashrut: update.kashrut,
        };
        match self.repository.update_profile(profile) {
            Ok(profile) => Ok(profile),
            Err(RepositoryError::NotFound) => Err(MarketplaceError::not_found("profile", user)),
            Err(other) => Err(other.into()),
        }
    }

    pub fn profile(&self, user: &UserId) -> Result<Profile, MarketplaceError> {
        self.repository
            .fetch_profile(user)?
            .ok_or_else(|| MarketplaceError::not_found("profile", user))
    }

    pub fn add_kashrut(&self, name: &str) -> Result<KashrutAuthority, MarketplaceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::BlankField { field: "name" }.into());
        }
        if name.chars().count() > 200 {
            return Err(ValidationError::FieldTooLong {
                field: "name",
                max: 200,
            }
            .into());
        }
        let authority = KashrutAuthority {
            id: KashrutId(next_id(&KASHRUT_SEQUENCE, "ksh")),
            name: name.to_string(),
        };
        Ok(self.repository.insert_kashrut(authority)?)
    }

    pub fn kashrut_authorities(&self) -> Result<Vec<KashrutAuthority>, MarketplaceError> {
        Ok(self.repository.kashrut_authorities()?)
    }

    fn kashrut(&self, id: &KashrutId) -> Result<KashrutAuthority, MarketplaceError> {
        self.repository
            .fetch_kashrut(id)?
            .ok_or_else(|| MarketplaceError::not_found("kashrut authority", id))
    }

    /// List a property; the acting user becomes its owner.
    pub fn register_property(
        &self,
        owner: &UserId,
        listing: PropertyListing,
    ) -> Result<Property, MarketplaceError> {
        listing.validate()?;
        let property = Property {
            id: PropertyId(next_id(&PROPERTY_SEQUENCE, "prop")),
            owner: owner.clone(),
            listing,
        };
        let stored = self.repository.insert_property(property)?;
        info!(property = %stored.id, owner = %owner, "property registered");
        Ok(stored)
    }

    pub fn property(&self, id: &PropertyId) -> Result<Property, MarketplaceError> {
        self.repository
            .fetch_property(id)?
            .ok_or_else(|| MarketplaceError::not_found("property", id))
    }

    /// Every property with no pending or accepted booking overlapping `range`.
    pub fn search_available(
        &self,
        range: Option<&DateRange>,
    ) -> Result<Vec<Property>, MarketplaceError> {
        let candidates = self.repository.properties()?;
        let bookings = self.repository.bookings()?;
        let available = available_properties(candidates, &bookings, range);
        debug!(?range, count = available.len(), "availability search");
        Ok(available)
    }

    /// Ask the owner of `target` for a swap against one of the requester's properties.
    pub fn request_booking(
        &self,
        requester: &UserId,
        target: &PropertyId,
        request: BookingRequest,
    ) -> Result<Booking, MarketplaceError> {
        let target = self.property(target)?;
        let offered = self.property(&request.my_property)?;
        let range = lifecycle::check_request(
            requester,
            &target,
            &offered,
            request.date_from,
            request.date_to,
        )?;

        let booking = Booking {
            id: BookingId(next_id(&BOOKING_SEQUENCE, "bkg")),
            requester: requester.clone(),
            property: target.id,
            my_property: offered.id,
            date_from: range.start,
            date_to: range.end,
            status: BookingStatus::Pending,
        };
        let stored = self.repository.insert_booking(booking)?;
        info!(
            booking = %stored.id,
            property = %stored.property,
            requester = %requester,
            "swap requested"
        );
        Ok(stored)
    }

    pub fn booking(&self, id: &BookingId) -> Result<Booking, MarketplaceError> {
        self.repository
            .fetch_booking(id)?
            .ok_or_else(|| MarketplaceError::not_found("booking", id))
    }

    /// Accept or decline a pending request on behalf of the target property's owner.
    pub fn decide_booking(
        &self,
        id: &BookingId,
        actor: &UserId,
        decision: Decision,
    ) -> Result<Booking, MarketplaceError> {
        let booking = self.booking(id)?;
        let target = self.property(&booking.property)?;
        let next = lifecycle::check_decision(&booking, &target, actor, decision)?;

        match self
            .repository
            .transition_booking(id, BookingStatus::Pending, next)
        {
            Ok(updated) => {
                info!(booking = %id, status = %updated.status, actor = %actor, "booking decided");
                Ok(updated)
            }
            Err(RepositoryError::StatusMismatch { current }) => {
                warn!(booking = %id, %current, "decision lost to a concurrent update");
                Err(MarketplaceError::InvalidTransition {
                    booking: id.clone(),
                    from: current,
                    to: next,
                })
            }
            Err(RepositoryError::NotFound) => Err(MarketplaceError::not_found("booking", id)),
            Err(other) => Err(other.into()),
        }
    }

    /// Decline every pending request that starts within the expiry window of `today`.
    pub fn sweep_expired_bookings(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<BookingId>, MarketplaceError> {
        let cutoff = lifecycle::expiry_cutoff(today, self.config.expiry_days);
        let mut declined = Vec::new();

        for booking in self.repository.bookings()? {
            if !lifecycle::is_expired(&booking, cutoff) {
                continue;
            }
            match self.repository.transition_booking(
                &booking.id,
                BookingStatus::Pending,
                BookingStatus::Declined,
            ) {
                Ok(_) => declined.push(booking.id),
                // Decided (or removed) since it was read; the owner's decision stands.
                Err(RepositoryError::StatusMismatch { .. }) | Err(RepositoryError::NotFound) => {}
                Err(other) => return Err(other.into()),
            }
        }

        if !declined.is_empty() {
            info!(%today, %cutoff, count = declined.len(), "expired swap requests declined");
        }
        Ok(declined)
    }

    /// Pending requests for properties `owner` owns, newest start date first.
    pub fn pending_for_owner(&self, owner: &UserId) -> Result<Vec<Booking>, MarketplaceError> {
        let owned = self.owned_property_ids(owner)?;
        let pending = self
            .repository
            .bookings()?
            .into_iter()
            .filter(|b| b.status == BookingStatus::Pending && owned.contains(&b.property))
            .collect();
        Ok(merge_sort_by_date_from_desc(pending))
    }

    /// Accepted swaps where `user` is on either side, newest start date first.
    pub fn next_escapes(&self, user: &UserId) -> Result<Vec<Booking>, MarketplaceError> {
        let owned = self.owned_property_ids(user)?;
        let accepted = self
            .repository
            .bookings()?
            .into_iter()
            .filter(|b| {
                b.status == BookingStatus::Accepted
                    && (owned.contains(&b.property) || owned.contains(&b.my_property))
            })
            .collect();
        Ok(merge_sort_by_date_from_desc(accepted))
    }

    /// Bookings `user` requested, whatever their status.
    pub fn reviewable_bookings(&self, user: &UserId) -> Result<Vec<Booking>, MarketplaceError> {
        Ok(self
            .repository
            .bookings()?
            .into_iter()
            .filter(|b| &b.requester == user)
            .collect())
    }

    /// Review the other party's property on a booking.
    pub fn leave_review(
        &self,
        booking_id: &BookingId,
        reviewer: &UserId,
        text: &str,
        stars: u8,
    ) -> Result<Review, MarketplaceError> {
        let booking = self.booking(booking_id)?;
        let target = self.property(&booking.property)?;
        let offered = self.property(&booking.my_property)?;
        let property_reviewed =
            lifecycle::reviewed_property(&booking, &target, &offered, reviewer)?;
        lifecycle::check_review(text, stars)?;

        let review = Review {
            id: ReviewId(next_id(&REVIEW_SEQUENCE, "rev")),
            booking: booking.id,
            property_reviewed,
            reviewer: reviewer.clone(),
            text: text.to_string(),
            stars,
        };
        let stored = self.repository.insert_review(review)?;
        info!(
            review = %stored.id,
            booking = %stored.booking,
            property = %stored.property_reviewed,
            "review left"
        );
        Ok(stored)
    }

    pub fn property_reviews(&self, id: &PropertyId) -> Result<Vec<Review>, MarketplaceError> {
        self.property(id)?;
        Ok(self.repository.reviews_for_property(id)?)
    }

    /// Mean star rating a property has received, if it has any reviews.
    pub fn property_rating(&self, id: &PropertyId) -> Result<Option<f32>, MarketplaceError> {
        let reviews = self.property_reviews(id)?;
        if reviews.is_empty() {
            return Ok(None);
        }
        let total: u32 = reviews.iter().map(|r| u32::from(r.stars)).sum();
        Ok(Some(total as f32 / reviews.len() as f32))
    }

    pub fn home_stats(&self) -> Result<HomeStats, MarketplaceError> {
        Ok(HomeStats {
            num_properties: self.repository.properties()?.len(),
            num_users: self.repository.profile_count()?,
            num_kashrut: self.repository.kashrut_authorities()?.len(),
        })
    }

    pub fn dashboard(&self, user: &UserId) -> Result<Dashboard, MarketplaceError> {
        let profile = self.profile(user)?;
        let user_kashrut = match &profile.kashrut {
            Some(id) => self.repository.fetch_kashrut(id)?,
            None => None,
        };
        Ok(Dashboard {
            num_properties: self.owned_property_ids(user)?.len(),
            user_kashrut,
        })
    }

    fn owned_property_ids(&self, owner: &UserId) -> Result<Vec<PropertyId>, MarketplaceError> {
        Ok(self
            .repository
            .properties()?
            .into_iter()
            .filter(|p| &p.owner == owner)
            .map(|p| p.id)
            .collect())
    }
}
