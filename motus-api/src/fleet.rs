use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::{NaiveTime, Weekday};
use motus_fleet::bus::{Bus, BusCategory, BusStatus};
use motus_fleet::route::Route;
use motus_fleet::schedule::Schedule;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::decode_claims;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/buses", post(add_bus).get(list_buses))
        .route("/v1/buses/{id}", put(update_bus).delete(delete_bus).get(get_bus))
        .route("/v1/buses/{id}/schedules", get(bus_schedules))
        .route("/v1/routes", post(add_route).get(list_routes))
        .route("/v1/routes/{id}", put(update_route))
        .route("/v1/schedules", post(add_schedule))
        .route("/v1/schedules/{id}", delete(delete_schedule))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    active_only: bool,
}

#[derive(Debug, Deserialize)]
struct AddBusRequest {
    number: String,
    name: String,
    category: BusCategory,
    total_seats: u32,
    base_fare_cents: i64,
}

async fn add_bus(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<AddBusRequest>,
) -> Result<Json<Bus>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    claims.require_admin()?;

    let bus = state
        .buses
        .add(&req.number, &req.name, req.category, req.total_seats, req.base_fare_cents)
        .await?;
    Ok(Json(bus))
}

#[derive(Debug, Deserialize)]
struct UpdateBusRequest {
    name: String,
    category: BusCategory,
    base_fare_cents: i64,
    status: BusStatus,
}

async fn update_bus(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBusRequest>,
) -> Result<Json<Bus>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    claims.require_admin()?;

    let bus = state
        .buses
        .update(id, &req.name, req.category, req.base_fare_cents, req.status)
        .await?;
    Ok(Json(bus))
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    deleted: Uuid,
}

async fn delete_bus(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    claims.require_admin()?;

    state.buses.delete(id).await?;
    Ok(Json(DeletedResponse { deleted: id }))
}

async fn get_bus(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Bus>, AppError> {
    decode_claims(bearer.token(), &state.auth.secret)?;
    Ok(Json(state.buses.get(id).await?))
}

async fn list_buses(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Bus>>, AppError> {
    decode_claims(bearer.token(), &state.auth.secret)?;

    let buses = if query.active_only {
        state.buses.list_active().await?
    } else {
        state.buses.list().await?
    };
    Ok(Json(buses))
}

async fn bus_schedules(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Schedule>>, AppError> {
    decode_claims(bearer.token(), &state.auth.secret)?;
    Ok(Json(state.schedules.list_for_bus(id).await?))
}

#[derive(Debug, Deserialize)]
struct AddRouteRequest {
    origin: String,
    destination: String,
    distance_km: f64,
    duration_minutes: u32,
    fare_multiplier: f64,
}

async fn add_route(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<AddRouteRequest>,
) -> Result<Json<Route>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    claims.require_admin()?;

    let route = state
        .routes
        .add(
            &req.origin,
            &req.destination,
            req.distance_km,
            req.duration_minutes,
            req.fare_multiplier,
        )
        .await?;
    Ok(Json(route))
}

#[derive(Debug, Deserialize)]
struct UpdateRouteRequest {
    distance_km: f64,
    duration_minutes: u32,
    fare_multiplier: f64,
}

async fn update_route(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRouteRequest>,
) -> Result<Json<Route>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    claims.require_admin()?;

    let route = state
        .routes
        .update(id, req.distance_km, req.duration_minutes, req.fare_multiplier)
        .await?;
    Ok(Json(route))
}

async fn list_routes(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Vec<Route>>, AppError> {
    decode_claims(bearer.token(), &state.auth.secret)?;
    Ok(Json(state.routes.list().await?))
}

#[derive(Debug, Deserialize)]
struct AddScheduleRequest {
    bus_id: Uuid,
    route_id: Uuid,
    departure: NaiveTime,
    arrival: NaiveTime,
    day_of_week: Weekday,
}

async fn add_schedule(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Json(req): Json<AddScheduleRequest>,
) -> Result<Json<Schedule>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    claims.require_admin()?;

    let schedule = state
        .schedules
        .add(req.bus_id, req.route_id, req.departure, req.arrival, req.day_of_week)
        .await?;
    Ok(Json(schedule))
}

async fn delete_schedule(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, AppError> {
    let claims = decode_claims(bearer.token(), &state.auth.secret)?;
    claims.require_admin()?;

    state.schedules.remove(id).await?;
    Ok(Json(DeletedResponse { deleted: id }))
}
