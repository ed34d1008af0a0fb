use chrono::{Days, Local, NaiveDate};
use clap::Args;
use houseswap::config::MarketplaceConfig;
use houseswap::error::AppError;
use houseswap::marketplace::{
    Booking, BookingRequest, DateRange, Decision, InMemoryMarketplace, MarketplaceError,
    PropertyListing, SwapService, UserId,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Date the demo treats as today (YYYY-MM-DD). Defaults to the local date.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Days before a pending request expires.
    #[arg(long, default_value_t = MarketplaceConfig::default().expiry_days)]
    pub(crate) expiry_days: u32,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let config = MarketplaceConfig {
        expiry_days: args.expiry_days,
        ..MarketplaceConfig::default()
    };
    let service = SwapService::new(Arc::new(InMemoryMarketplace::default()), config);

    println!("HouseSwap demo (today {today})");

    let sarah = UserId("sarah".to_string());
    let moshe = UserId("moshe".to_string());
    service.register_user(&sarah)?;
    service.register_user(&moshe)?;
    let kashrut = service.add_kashrut("London Beth Din")?;
    println!("- Registered users {sarah} and {moshe}; kashrut authority {}", kashrut.name);

    let golders_green = service.register_property(
        &sarah,
        demo_listing("GB", "London", "NW11 8AB", "14 Golders Gardens"),
    )?;
    let antwerp = service.register_property(
        &moshe,
        demo_listing("BE", "Antwerp", "2018", "3 Lange Kievitstraat"),
    )?;
    println!(
        "- Listed {} ({}) and {} ({})",
        golders_green.id, golders_green.listing.city, antwerp.id, antwerp.listing.city
    );

    let stay_from = shift(today, 14);
    let stay_to = shift(today, 21);
    let swap = service.request_booking(
        &moshe,
        &golders_green.id,
        BookingRequest {
            my_property: antwerp.id.clone(),
            date_from: stay_from,
            date_to: stay_to,
        },
    )?;
    let last_minute = service.request_booking(
        &moshe,
        &golders_green.id,
        BookingRequest {
            my_property: antwerp.id.clone(),
            date_from: today,
            date_to: shift(today, 2),
        },
    )?;
    println!("- {moshe} requested two swaps for {}", golders_green.id);
    render_bookings("  Pending for sarah", &service.pending_for_owner(&sarah)?);

    let range = DateRange::new(stay_from, stay_to).map_err(MarketplaceError::from)?;
    let available = service.search_available(Some(&range))?;
    println!(
        "- Available {stay_from} -> {stay_to}: {}",
        available
            .iter()
            .map(|p| p.id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let expired = service.sweep_expired_bookings(today)?;
    println!(
        "- Expiry sweep declined {} request(s): {}",
        expired.len(),
        expired
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    let last_minute = service.booking(&last_minute.id)?;
    println!("  {} is now {}", last_minute.id, last_minute.status);

    match service.decide_booking(&swap.id, &moshe, Decision::Accept) {
        Ok(_) => println!("- Unexpected: requester accepted their own request"),
        Err(err) => println!("- {moshe} cannot accept: {err}"),
    }
    let accepted = service.decide_booking(&swap.id, &sarah, Decision::Accept)?;
    println!("- {sarah} accepted {} -> {}", accepted.id, accepted.status);
    render_bookings("  Next escapes for moshe", &service.next_escapes(&moshe)?);

    let host_review = service.leave_review(&swap.id, &sarah, "Left the flat spotless", 5)?;
    let guest_review = service.leave_review(&swap.id, &moshe, "Succah was a highlight", 4)?;
    for review in [&host_review, &guest_review] {
        println!(
            "- {} reviewed {} with {} star(s): {}",
            review.reviewer, review.property_reviewed, review.stars, review.text
        );
    }
    match service.leave_review(&swap.id, &UserId("stranger".to_string()), "", 1) {
        Ok(_) => println!("- Unexpected: stranger left a review"),
        Err(err) => println!("- Stranger review rejected: {err}"),
    }

    let stats = service.home_stats()?;
    println!(
        "\nTotals: {} properties | {} users | {} kashrut authorities",
        stats.num_properties, stats.num_users, stats.num_kashrut
    );
    Ok(())
}

fn shift(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(date)
}

fn render_bookings(title: &str, bookings: &[Booking]) {
    if bookings.is_empty() {
        println!("{title}: none");
        return;
    }
    println!("{title}:");
    for booking in bookings {
        println!(
            "    - {} {} -> {} for {} (offering {}) [{}]",
            booking.id,
            booking.date_from,
            booking.date_to,
            booking.property,
            booking.my_property,
            booking.status
        );
    }
}

fn demo_listing(country: &str, city: &str, postcode: &str, address: &str) -> PropertyListing {
    PropertyListing {
        country: country.to_string(),
        city: city.to_string(),
        postcode: postcode.to_string(),
        address: address.to_string(),
        no_of_rooms: 4,
        estimated_value: 850_000.0,
        property_type: "Flat".to_string(),
        pet_friendly: false,
        proximity_to_public_transport: 6,
        succah: true,
        passover_kitchen: false,
        max_occupancy: 6,
        smoking_allowed: false,
        home_description: "Walking distance to several shuls".to_string(),
        image_keys: Vec::new(),
    }
}
