use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::MarketplaceConfig;
use crate::marketplace::domain::{
    Booking, BookingId, BookingRequest, BookingStatus, KashrutAuthority, KashrutId, Profile,
    Property, PropertyId, PropertyListing, Review, UserId,
};
use crate::marketplace::navigation::NavigationHistory;
use crate::marketplace::repository::{MarketplaceRepository, RepositoryError};
use crate::marketplace::router::{marketplace_router, USER_HEADER};
use crate::marketplace::service::SwapService;
use crate::marketplace::store::InMemoryMarketplace;

pub(super) fn user(name: &str) -> UserId {
    UserId(name.to_string())
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn listing(city: &str) -> PropertyListing {
    PropertyListing {
        country: "GB".to_string(),
        city: city.to_string(),
        postcode: "M7 4AA".to_string(),
        address: "22 Leicester Road".to_string(),
        no_of_rooms: 5,
        estimated_value: 420_000.0,
        property_type: "Semi-detached".to_string(),
        pet_friendly: false,
        proximity_to_public_transport: 8,
        succah: true,
        passover_kitchen: true,
        max_occupancy: 7,
        smoking_allowed: false,
        home_description: "Garden, close to shul".to_string(),
        image_keys: vec!["images/front.jpg".to_string()],
    }
}

pub(super) fn build_service() -> (SwapService<InMemoryMarketplace>, Arc<InMemoryMarketplace>) {
    let repository = Arc::new(InMemoryMarketplace::default());
    let service = SwapService::new(repository.clone(), MarketplaceConfig::default());
    (service, repository)
}

/// Two owners with one property each, as most swap scenarios need.
pub(super) struct SwapFixture {
    pub(super) service: SwapService<InMemoryMarketplace>,
    pub(super) repository: Arc<InMemoryMarketplace>,
    pub(super) host: UserId,
    pub(super) guest: UserId,
    pub(super) host_home: Property,
    pub(super) guest_home: Property,
}

pub(super) fn swap_fixture() -> SwapFixture {
    let (service, repository) = build_service();
    let host = user("host");
    let guest = user("guest");
    let host_home = service
        .register_property(&host, listing("Manchester"))
        .expect("host property registers");
    let guest_home = service
        .register_property(&guest, listing("Gateshead"))
        .expect("guest property registers");
    SwapFixture {
        service,
        repository,
        host,
        guest,
        host_home,
        guest_home,
    }
}

impl SwapFixture {
    pub(super) fn request(&self, from: NaiveDate, to: NaiveDate) -> Booking {
        self.service
            .request_booking(
                &self.guest,
                &self.host_home.id,
                BookingRequest {
                    my_property: self.guest_home.id.clone(),
                    date_from: from,
                    date_to: to,
                },
            )
            .expect("swap request accepted")
    }
}

pub(super) fn router_for(service: SwapService<InMemoryMarketplace>) -> Router {
    marketplace_router(Arc::new(service), Arc::new(NavigationHistory::new(10)))
}

pub(super) fn get_as(uri: &str, user: &str) -> Request<Body> {
    Request::get(uri)
        .header(USER_HEADER, user)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) fn post_json_as(uri: &str, user: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(USER_HEADER, user)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Repository that refuses every call, for error propagation checks.
pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl MarketplaceRepository for UnavailableRepository {
    fn insert_property(&self, _property: Property) -> Result<Property, RepositoryError> {
        offline()
    }

    fn fetch_property(&self, _id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        offline()
    }

    fn properties(&self) -> Result<Vec<Property>, RepositoryError> {
        offline()
    }

    fn insert_booking(&self, _booking: Booking) -> Result<Booking, RepositoryError> {
        offline()
    }

    fn fetch_booking(&self, _id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        offline()
    }

    fn bookings(&self) -> Result<Vec<Booking>, RepositoryError> {
        offline()
    }

    fn transition_booking(
        &self,
        _id: &BookingId,
        _expected: BookingStatus,
        _next: BookingStatus,
    ) -> Result<Booking, RepositoryError> {
        offline()
    }

    fn insert_review(&self, _review: Review) -> Result<Review, RepositoryError> {
        offline()
    }

    fn reviews_for_property(&self, _id: &PropertyId) -> Result<Vec<Review>, RepositoryError> {
        offline()
    }

    fn insert_profile(&self, _profile: Profile) -> Result<Profile, RepositoryError> {
        offline()
    }

    fn update_profile(&self, _profile: Profile) -> Result<Profile, RepositoryError> {
        offline()
    }

    fn fetch_profile(&self, _user: &UserId) -> Result<Option<Profile>, RepositoryError> {
        offline()
    }

    fn profile_count(&self) -> Result<usize, RepositoryError> {
        offline()
    }

    fn insert_kashrut(
        &self,
        _authority: KashrutAuthority,
    ) -> Result<KashrutAuthority, RepositoryError> {
        offline()
    }

    fn fetch_kashrut(&self, _id: &KashrutId) -> Result<Option<KashrutAuthority>, RepositoryError> {
        offline()
    }

    fn kashrut_authorities(&self) -> Result<Vec<KashrutAuthority>, RepositoryError> {
        offline()
    }
}
