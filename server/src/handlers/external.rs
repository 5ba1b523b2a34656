use axum::extract::{Query, State};
use axum::response::Response;
use chrono::Utc;

use crate::external::{fetch_json, filter_by_category, seatgeek, ticketmaster, ExternalQuery};
use crate::models::ExternalFeed;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

const MISSING_LOCATION: &str = "Please provide a city or state to search for local events";

/// `GET /api/events/external`: Ticketmaster Discovery, normalized.
pub async fn external_events(
    State(state): State<AppState>,
    Query(query): Query<ExternalQuery>,
) -> Result<Response, AppError> {
    let credential = ticketmaster::select_credential(&state.config.discovery).ok_or_else(|| {
        AppError::NotConfigured {
            message: "Ticketmaster API key not configured".to_string(),
            details: Some(ticketmaster::setup_hints()),
        }
    })?;

    if query.city().is_none() && query.state().is_none() {
        let feed = ExternalFeed::empty(ticketmaster::SOURCE, MISSING_LOCATION);
        return Ok(success(feed, "No location provided"));
    }

    let request = ticketmaster::build_request(credential, &query);
    tracing::info!(
        via = credential.label(),
        city = query.city(),
        state = query.state(),
        size = query.page_size(),
        "Fetching external events"
    );

    let body = fetch_json(
        &state.http,
        &request,
        ticketmaster::SOURCE,
        state.config.discovery.timeout,
    )
    .await?;

    let raw_count = ticketmaster::raw_events(&body).len();
    let events = ticketmaster::normalize(&body, &query, Utc::now());
    let events = filter_by_category(events, query.category());

    let mut feed = ExternalFeed::new(events, ticketmaster::SOURCE);
    if state.config.development {
        feed.debug = Some(ticketmaster::debug_summary(&body, raw_count, feed.total));
    }

    tracing::info!(raw_count, returned = feed.total, "External events fetched");
    Ok(success(feed, "External events retrieved successfully"))
}

/// `GET /api/events/external/seatgeek`: SeatGeek through the marketplace key.
pub async fn seatgeek_events(
    State(state): State<AppState>,
    Query(query): Query<ExternalQuery>,
) -> Result<Response, AppError> {
    let Some(request) = seatgeek::build_request(&state.config.discovery, &query) else {
        return Err(AppError::NotConfigured {
            message: "RapidAPI key not configured".to_string(),
            details: None,
        });
    };

    if query.city().is_none() {
        let feed = ExternalFeed::empty(seatgeek::SOURCE, "Please provide a city to search for events");
        return Ok(success(feed, "No location provided"));
    }

    let body = fetch_json(
        &state.http,
        &request,
        seatgeek::SOURCE,
        state.config.discovery.timeout,
    )
    .await?;
    let feed = ExternalFeed::new(seatgeek::normalize(&body, Utc::now()), seatgeek::SOURCE);

    tracing::info!(returned = feed.total, "SeatGeek events fetched");
    Ok(success(feed, "External events retrieved successfully"))
}
