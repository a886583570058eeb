use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use futures_util::{Stream, StreamExt};
use motus_reserve::inventory::SeatState;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::auth::decode_claims;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/buses/{id}/seatmap", get(seat_map))
        .route("/v1/buses/{id}/availability", get(availability))
        .route("/v1/buses/{id}/events", get(seat_events))
        .route("/v1/buses/{id}/seats/{seat}/block", post(block_seat))
        .route("/v1/buses/{id}/seats/{seat}/unblock", post(unblock_seat))
        .route("/v1/buses/{id}/inventory/rebuild", post(rebuild_inventory))
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct SeatView {
    seat_number: u32,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    booking_id: Option<Uuid>,
}

impl SeatView {
    fn new(seat_number: u32, state: SeatState) -> Self {
        let (status, booking_id) = match state {
            SeatState::Available => ("AVAILABLE", None),
            SeatState::Occupied { booking } => ("OCCUPIED", Some(booking)),
            SeatState::Blocked => ("BLOCKED", None),
        };
        Self {
            seat_number,
            status,
            booking_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct SeatMapResponse {
    bus_id: Uuid,
    travel_date: NaiveDate,
    seats: Vec<SeatView>,
}

async fn seat_map(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<SeatMapResponse>, AppError> {
    decode_claims(bearer.token(), &state.auth.secret)?;

    let layout = state.coordinator.seat_map(id, query.date).await?;
    Ok(Json(SeatMapResponse {
        bus_id: id,
        travel_date: query.date,
        seats: layout
            .into_iter()
            .map(|(seat, seat_state)| SeatView::new(seat, seat_state))
            .collect(),
    }))
}

#[derive(Debug, Serialize)]
struct AvailabilityResponse {
    bus_id: Uuid,
    travel_date: NaiveDate,
    available: u32,
}

async fn availability(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    decode_claims(bearer.token(), &state.auth.secret)?;

    let available = state.coordinator.available_count(id, query.date).await?;
    Ok(Json(AvailabilityResponse {
        bus_id: id,
        travel_date: query.date,
        available,
    }))
}

/// Server-sent stream of seat transitions for one bus, for live seat-map
/// rendering.
async fn seat_events(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    decode_claims(bearer.token(), &state.auth.secret)?;

    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) if event.bus_id() == id => match serde_json::to_string(&event) {
                Ok(payload) => Some(Ok::<_, Infallible>(
                    Event::default().event("seat_update").data(payload),
                )),
                Err(_) => None,
            },
            _ => None,
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[derive(Debug, Serialize)]
struct SeatActionResponse {
    status: &'static str,
}

async fn block_seat(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path((id, seat)): Path<(Uuid, u32)>,
    Query(query): Query<DateQuery>,
) -> Result<Json<SeatActionResponse>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    claims.require_admin()?;

    state.coordinator.block_seat(id, seat, query.date).await?;
    Ok(Json(SeatActionResponse { status: "BLOCKED" }))
}

async fn unblock_seat(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path((id, seat)): Path<(Uuid, u32)>,
    Query(query): Query<DateQuery>,
) -> Result<Json<SeatActionResponse>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    claims.require_admin()?;

    state.coordinator.unblock_seat(id, seat, query.date).await?;
    Ok(Json(SeatActionResponse { status: "AVAILABLE" }))
}

async fn rebuild_inventory(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<SeatActionResponse>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    claims.require_admin()?;

    state.coordinator.rebuild_inventory(id, query.date).await?;
    Ok(Json(SeatActionResponse { status: "REBUILT" }))
}
