use std::sync::Arc;

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request, State,
    },
    http::{request::Parts, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Local;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use super::domain::{
    BookingId, BookingRequest, DateRange, Decision, ProfileUpdate, PropertyId,
    PropertyListing, UserId,
};
use super::error::MarketplaceError;
use super::navigation::NavigationHistory;
use super::repository::{MarketplaceRepository, RepositoryError};
use super::service::SwapService;

/// Header the fronting auth layer uses to pass the authenticated user.
pub const USER_HEADER: &str = "x-user-id";

/// Shared state for marketplace handlers.
pub struct MarketplaceRoutes<R> {
    pub service: Arc<SwapService<R>>,
    pub navigation: Arc<NavigationHistory>,
}

impl<R> Clone for MarketplaceRoutes<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            navigation: self.navigation.clone(),
        }
    }
}

/// Router builder exposing the marketplace endpoints and back navigation.
pub fn marketplace_router<R>(
    service: Arc<SwapService<R>>,
    navigation: Arc<NavigationHistory>,
) -> Router
where
    R: MarketplaceRepository + 'static,
{
    let state = MarketplaceRoutes {
        service,
        navigation,
    };

    Router::new()
        .route("/api/v1/stats", get(stats_handler::<R>))
        .route("/api/v1/users", post(register_user_handler::<R>))
        .route("/api/v1/profile", put(update_profile_handler::<R>))
        .route("/api/v1/dashboard", get(dashboard_handler::<R>))
        .route(
            "/api/v1/kashrut",
            get(list_kashrut_handler::<R>).post(add_kashrut_handler::<R>),
        )
        .route(
            "/api/v1/properties",
            get(search_handler::<R>).post(register_property_handler::<R>),
        )
        .route("/api/v1/properties/:property_id", get(property_handler::<R>))
        .route(
            "/api/v1/properties/:property_id/bookings",
            post(request_booking_handler::<R>),
        )
        .route("/api/v1/bookings/pending", get(pending_handler::<R>))
        .route("/api/v1/bookings/sweep", post(sweep_handler::<R>))
        .route("/api/v1/bookings/escapes", get(escapes_handler::<R>))
        .route(
            "/api/v1/bookings/:booking_id/decision",
            post(decision_handler::<R>),
        )
        .route(
            "/api/v1/bookings/:booking_id/reviews",
            post(review_handler::<R>),
        )
        .route("/api/v1/reviews/eligible", get(eligible_reviews_handler::<R>))
        .route("/back", get(back_handler::<R>))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track_visit::<R>,
        ))
        .with_state(state)
}

/// Authenticated identity taken from [`USER_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser(pub UserId);

pub(crate) fn user_from_headers(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| UserId(value.to_string()))
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_headers(&parts.headers)
            .map(ActingUser)
            .ok_or_else(|| {
                error_response(
                    StatusCode::UNAUTHORIZED,
                    format!("missing {USER_HEADER} header"),
                )
            })
    }
}

/// JSON body whose rejections carry the `{ "error": .. }` payload.
pub(crate) struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(request, state)
            .await
            .map(|Json(value)| JsonBody(value))
            .map_err(|rejection: JsonRejection| {
                error_response(rejection.status(), rejection.body_text())
            })
    }
}

/// Query string extractor with JSON rejections.
pub(crate) struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| QueryParams(value))
            .map_err(|rejection: QueryRejection| {
                error_response(rejection.status(), rejection.body_text())
            })
    }
}

/// Path parameter extractor with JSON rejections.
pub(crate) struct PathParam<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| PathParam(value))
            .map_err(|rejection: PathRejection| {
                error_response(rejection.status(), rejection.body_text())
            })
    }
}

impl IntoResponse for MarketplaceError {
    fn into_response(self) -> Response {
        let status = match &self {
            MarketplaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            MarketplaceError::Unauthorized(_) => StatusCode::FORBIDDEN,
            MarketplaceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MarketplaceError::InvalidTransition { .. } => StatusCode::CONFLICT,
            MarketplaceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            MarketplaceError::Repository(RepositoryError::Conflict)
            | MarketplaceError::Repository(RepositoryError::StatusMismatch { .. }) => {
                StatusCode::CONFLICT
            }
            MarketplaceError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_response(status, self.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NavigationQuery {
    #[serde(default)]
    back: bool,
}

/// Records successful page views so `/back` can return to them.
pub(crate) async fn track_visit<R>(
    State(state): State<MarketplaceRoutes<R>>,
    request: Request,
    next: Next,
) -> Response
where
    R: MarketplaceRepository + 'static,
{
    let path = request.uri().path().to_string();
    let is_back_link = Query::<NavigationQuery>::try_from_uri(request.uri())
        .map(|Query(query)| query.back)
        .unwrap_or(false);
    let user = user_from_headers(request.headers());
    let trackable = request.method() == Method::GET && path != "/back";

    let response = next.run(request).await;

    if trackable && response.status().is_success() {
        if let Some(user) = user {
            state.navigation.visit(&user, &path, is_back_link);
        }
    }
    response
}

pub(crate) async fn back_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    user: Option<ActingUser>,
) -> Redirect
where
    R: MarketplaceRepository + 'static,
{
    let previous = user.and_then(|ActingUser(user)| state.navigation.back(&user));
    match previous {
        Some(path) => Redirect::to(&format!("{path}?back=true")),
        None => Redirect::to("/"),
    }
}

pub(crate) async fn stats_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let stats = state.service.home_stats()?;
    Ok(Json(stats).into_response())
}

pub(crate) async fn register_user_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(user): ActingUser,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let profile = state.service.register_user(&user)?;
    Ok((StatusCode::CREATED, Json(profile)).into_response())
}

pub(crate) async fn update_profile_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(user): ActingUser,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let profile = state.service.update_profile(&user, update)?;
    Ok(Json(profile).into_response())
}

pub(crate) async fn dashboard_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(user): ActingUser,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let dashboard = state.service.dashboard(&user)?;
    Ok(Json(dashboard).into_response())
}

pub(crate) async fn list_kashrut_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let authorities = state.service.kashrut_authorities()?;
    Ok(Json(json!({ "kashrut": authorities })).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct KashrutRequest {
    name: String,
}

pub(crate) async fn add_kashrut_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(_user): ActingUser,
    JsonBody(request): JsonBody<KashrutRequest>,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let authority = state.service.add_kashrut(&request.name)?;
    Ok((StatusCode::CREATED, Json(authority)).into_response())
}

pub(crate) async fn register_property_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(owner): ActingUser,
    JsonBody(listing): JsonBody<PropertyListing>,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let property = state.service.register_property(&owner, listing)?;
    Ok((StatusCode::CREATED, Json(property)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

pub(crate) async fn search_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let range =
        DateRange::from_search_bounds(query.start_date.as_deref(), query.end_date.as_deref())?;
    let properties = state.service.search_available(range.as_ref())?;
    Ok(Json(json!({ "properties": properties })).into_response())
}

pub(crate) async fn property_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    PathParam(property_id): PathParam<String>,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let id = PropertyId(property_id);
    let property = state.service.property(&id)?;
    let reviews = state.service.property_reviews(&id)?;
    let rating = state.service.property_rating(&id)?;
    Ok(Json(json!({
        "property": property,
        "rating": rating,
        "reviews": reviews,
    }))
    .into_response())
}

pub(crate) async fn request_booking_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(requester): ActingUser,
    PathParam(property_id): PathParam<String>,
    JsonBody(request): JsonBody<BookingRequest>,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let booking = state
        .service
        .request_booking(&requester, &PropertyId(property_id), request)?;
    Ok((StatusCode::CREATED, Json(booking)).into_response())
}

/// Sweeps expired requests first so the owner never sees one that can no longer be accepted.
pub(crate) async fn pending_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(owner): ActingUser,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    state
        .service
        .sweep_expired_bookings(Local::now().date_naive())?;
    let bookings = state.service.pending_for_owner(&owner)?;
    Ok(Json(json!({ "bookings": bookings })).into_response())
}

/// The expiry clock is the server's local date; callers cannot move it.
pub(crate) async fn sweep_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(_user): ActingUser,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let today = Local::now().date_naive();
    let declined = state.service.sweep_expired_bookings(today)?;
    Ok(Json(json!({ "today": today, "declined": declined })).into_response())
}

pub(crate) async fn escapes_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(user): ActingUser,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let bookings = state.service.next_escapes(&user)?;
    Ok(Json(json!({ "bookings": bookings })).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    action: Decision,
}

pub(crate) async fn decision_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(actor): ActingUser,
    PathParam(booking_id): PathParam<String>,
    JsonBody(request): JsonBody<DecisionRequest>,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let booking = state
        .service
        .decide_booking(&BookingId(booking_id), &actor, request.action)?;
    Ok(Json(booking).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    #[serde(default)]
    text: String,
    stars: u8,
}

pub(crate) async fn review_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(reviewer): ActingUser,
    PathParam(booking_id): PathParam<String>,
    JsonBody(request): JsonBody<ReviewRequest>,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let review = state.service.leave_review(
        &BookingId(booking_id),
        &reviewer,
        &request.text,
        request.stars,
    )?;
    Ok((StatusCode::CREATED, Json(review)).into_response())
}

pub(crate) async fn eligible_reviews_handler<R>(
    State(state): State<MarketplaceRoutes<R>>,
    ActingUser(user): ActingUser,
) -> Result<Response, MarketplaceError>
where
    R: MarketplaceRepository + 'static,
{
    let bookings = state.service.reviewable_bookings(&user)?;
    Ok(Json(json!({ "bookings": bookings })).into_response())
}
