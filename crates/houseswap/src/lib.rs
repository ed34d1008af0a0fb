//! Property swap marketplace: listings, availability search, swap requests and reviews.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;
