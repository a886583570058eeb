use async_trait::async_trait;
use motus_core::StoreResult;
use uuid::Uuid;

use crate::bus::Bus;
use crate::route::Route;
use crate::schedule::Schedule;

#[async_trait]
pub trait BusStore: Send + Sync {
    async fn insert(&self, bus: &Bus) -> StoreResult<()>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<Bus>>;

    async fn find_by_number(&self, number: &str) -> StoreResult<Option<Bus>>;

    async fn update(&self, bus: &Bus) -> StoreResult<bool>;

    async fn remove(&self, id: Uuid) -> StoreResult<bool>;

    async fn list(&self) -> StoreResult<Vec<Bus>>;

    async fn list_active(&self) -> StoreResult<Vec<Bus>>;
}

#[async_trait]
pub trait RouteStore: Send + Sync {
    async fn insert(&self, route: &Route) -> StoreResult<()>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<Route>>;

    async fn update(&self, route: &Route) -> StoreResult<bool>;

    async fn remove(&self, id: Uuid) -> StoreResult<bool>;

    async fn list(&self) -> StoreResult<Vec<Route>>;
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn insert(&self, schedule: &Schedule) -> StoreResult<()>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<Schedule>>;

    async fn remove(&self, id: Uuid) -> StoreResult<bool>;

    async fn list_for_bus(&self, bus_id: Uuid) -> StoreResult<Vec<Schedule>>;
}

/// Seam between the fleet registry and the booking side: bus deletion must be
/// refused while any CONFIRMED booking still references the bus. Implemented
/// by every booking store backend.
#[async_trait]
pub trait ConfirmedBookingProbe: Send + Sync {
    async fn has_confirmed_for_bus(&self, bus_id: Uuid) -> StoreResult<bool>;
}
