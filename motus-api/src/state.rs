use motus_fleet::registry::{BusRegistry, RouteRegistry, ScheduleRegistry};
use motus_reserve::coordinator::ReservationCoordinator;
use motus_shared::events::ReservationEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ReservationCoordinator>,
    pub buses: Arc<BusRegistry>,
    pub routes: Arc<RouteRegistry>,
    pub schedules: Arc<ScheduleRegistry>,
    pub events: broadcast::Sender<ReservationEvent>,
    pub auth: AuthConfig,
}
