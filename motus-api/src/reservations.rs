use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use motus_reserve::coordinator::ReserveRequest;
use motus_reserve::models::Booking;
use motus_shared::pii::Masked;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::decode_claims;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reservations", post(create_reservation))
        .route("/v1/reservations/mine", get(my_reservations))
        .route("/v1/reservations/{id}", delete(cancel_reservation))
        .route("/v1/reservations/{id}/contact", patch(update_contact))
        .route("/v1/buses/{id}/reservations", get(bus_reservations))
}

#[derive(Debug, Deserialize)]
struct CreateReservationRequest {
    bus_id: Uuid,
    schedule_id: Uuid,
    seat_number: u32,
    passenger_name: String,
    passenger_phone: String,
    travel_date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct CancelResponse {
    booking_id: Uuid,
    status: String,
}

async fn create_reservation(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<Json<Booking>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;

    let booking = state
        .coordinator
        .reserve(ReserveRequest {
            user_id: claims.sub,
            bus_id: req.bus_id,
            schedule_id: req.schedule_id,
            seat_number: req.seat_number,
            passenger_name: req.passenger_name,
            passenger_phone: Masked::new(req.passenger_phone),
            travel_date: req.travel_date,
        })
        .await?;

    info!(booking_id = %booking.id, "reservation created");
    Ok(Json(booking))
}

async fn cancel_reservation(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelResponse>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;

    let cancelled = state.coordinator.cancel(id, claims.sub).await?;
    Ok(Json(CancelResponse {
        booking_id: cancelled.id,
        status: cancelled.status.as_str().to_string(),
    }))
}

#[derive(Debug, Deserialize)]
struct UpdateContactRequest {
    passenger_name: String,
    passenger_phone: String,
}

async fn update_contact(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<Json<Booking>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;

    let booking = state
        .coordinator
        .update_contact(
            id,
            claims.sub,
            &req.passenger_name,
            &Masked::new(req.passenger_phone),
        )
        .await?;
    Ok(Json(booking))
}

async fn my_reservations(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    let bookings = state.coordinator.bookings_for_user(claims.sub).await?;
    Ok(Json(bookings))
}

async fn bus_reservations(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    claims.require_admin()?;

    let bookings = state.coordinator.bookings_for_bus(id).await?;
    Ok(Json(bookings))
}
