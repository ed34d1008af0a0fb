//! Swap marketplace: properties, availability search, swap requests, decisions and reviews.

pub mod availability;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod navigation;
pub mod ordering;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use availability::available_properties;
pub use domain::{
    Booking, BookingId, BookingRequest, BookingStatus, Dashboard, DateRange, Decision, HomeStats,
    KashrutAuthority, KashrutId, Profile, ProfileUpdate, Property, PropertyId, PropertyListing,
    Review, ReviewId, UserId,
};
pub use error::{MarketplaceError, ValidationError};
pub use navigation::{NavigationHistory, VisitedPages};
pub use ordering::merge_sort_by_date_from_desc;
pub use repository::{MarketplaceRepository, RepositoryError};
pub use router::{marketplace_router, ActingUser, USER_HEADER};
pub use service::SwapService;
pub use store::InMemoryMarketplace;
