use super::domain::{
    Booking, BookingId, BookingStatus, KashrutAuthority, KashrutId, Profile, Property, PropertyId,
    Review, UserId,
};

/// Storage abstraction so the service can be exercised against any backend.
///
/// Listing methods return rows in arrival order; the ordering utility relies on it for ties.
pub trait MarketplaceRepository: Send + Sync {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError>;
    fn fetch_property(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError>;
    fn properties(&self) -> Result<Vec<Property>, RepositoryError>;

    fn insert_booking(&self, booking: Booking) -> Result<Booking, RepositoryError>;
    fn fetch_booking(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;
    fn bookings(&self) -> Result<Vec<Booking>, RepositoryError>;
    /// Compare-and-swap on status: only writes when the stored status equals `expected`.
    fn transition_booking(
        &self,
        id: &BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Booking, RepositoryError>;

    /// Rejects a second review by the same reviewer on the same booking.
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError>;
    fn reviews_for_property(&self, id: &PropertyId) -> Result<Vec<Review>, RepositoryError>;

    fn insert_profile(&self, profile: Profile) -> Result<Profile, RepositoryError>;
    fn update_profile(&self, profile: Profile) -> Result<Profile, RepositoryError>;
    fn fetch_profile(&self, user: &UserId) -> Result<Option<Profile>, RepositoryError>;
    fn profile_count(&self) -> Result<usize, RepositoryError>;

    fn insert_kashrut(&self, authority: KashrutAuthority)
        -> Result<KashrutAuthority, RepositoryError>;
    fn fetch_kashrut(&self, id: &KashrutId) -> Result<Option<KashrutAuthority>, RepositoryError>;
    /// Authorities sorted alphabetically by name.
    fn kashrut_authorities(&self) -> Result<Vec<KashrutAuthority>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("booking status changed concurrently (now {current})")]
    StatusMismatch { current: BookingStatus },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
