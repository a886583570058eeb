use chrono::{NaiveTime, Utc, Weekday};
use motus_core::StoreError;
use std::sync::Arc;
use uuid::Uuid;

use crate::bus::{Bus, BusCategory, BusStatus};
use crate::repository::{BusStore, ConfirmedBookingProbe, RouteStore, ScheduleStore};
use crate::route::Route;
use crate::schedule::Schedule;

#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("bus not found: {0}")]
    BusNotFound(Uuid),

    #[error("route not found: {0}")]
    RouteNotFound(Uuid),

    #[error("schedule not found: {0}")]
    ScheduleNotFound(Uuid),

    #[error("bus {0} still has confirmed bookings")]
    BusInUse(Uuid),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Fleet reference-data registry. Validation lives here; the store handles
/// are passed in at construction, never reached through a global.
pub struct BusRegistry {
    buses: Arc<dyn BusStore>,
    bookings: Arc<dyn ConfirmedBookingProbe>,
}

impl BusRegistry {
    pub fn new(buses: Arc<dyn BusStore>, bookings: Arc<dyn ConfirmedBookingProbe>) -> Self {
        Self { buses, bookings }
    }

    pub async fn add(
        &self,
        number: &str,
        name: &str,
        category: BusCategory,
        total_seats: u32,
        base_fare_cents: i64,
    ) -> Result<Bus, FleetError> {
        if number.trim().is_empty() {
            return Err(FleetError::InvalidInput("bus number must not be empty"));
        }
        if name.trim().is_empty() {
            return Err(FleetError::InvalidInput("bus name must not be empty"));
        }
        if total_seats == 0 {
            return Err(FleetError::InvalidInput("total seats must be positive"));
        }
        if base_fare_cents <= 0 {
            return Err(FleetError::InvalidInput("base fare must be positive"));
        }

        let bus = Bus::new(number.trim(), name.trim(), category, total_seats, base_fare_cents);
        self.buses.insert(&bus).await?;
        tracing::info!(bus_id = %bus.id, number = %bus.number, "bus registered");
        Ok(bus)
    }

    /// Updates everything except the seat plan: `total_seats` is fixed at
    /// creation because date-scoped occupancy sheets are sized from it.
    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        category: BusCategory,
        base_fare_cents: i64,
        status: BusStatus,
    ) -> Result<Bus, FleetError> {
        if name.trim().is_empty() {
            return Err(FleetError::InvalidInput("bus name must not be empty"));
        }
        if base_fare_cents <= 0 {
            return Err(FleetError::InvalidInput("base fare must be positive"));
        }

        let mut bus = self
            .buses
            .find(id)
            .await?
            .ok_or(FleetError::BusNotFound(id))?;
        bus.name = name.trim().to_string();
        bus.category = category;
        bus.base_fare_cents = base_fare_cents;
        bus.status = status;
        bus.updated_at = Utc::now();

        if !self.buses.update(&bus).await? {
            return Err(FleetError::BusNotFound(id));
        }
        Ok(bus)
    }

    /// Cascading delete of the bus and its seat plan, refused while any
    /// confirmed booking still references the bus.
    pub async fn delete(&self, id: Uuid) -> Result<(), FleetError> {
        if self.buses.find(id).await?.is_none() {
            return Err(FleetError::BusNotFound(id));
        }
        if self.bookings.has_confirmed_for_bus(id).await? {
            return Err(FleetError::BusInUse(id));
        }
        self.buses.remove(id).await?;
        tracing::info!(bus_id = %id, "bus deleted");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Bus, FleetError> {
        self.buses
            .find(id)
            .await?
            .ok_or(FleetError::BusNotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Bus>, FleetError> {
        Ok(self.buses.list().await?)
    }

    pub async fn list_active(&self) -> Result<Vec<Bus>, FleetError> {
        Ok(self.buses.list_active().await?)
    }
}

pub struct RouteRegistry {
    routes: Arc<dyn RouteStore>,
}

impl RouteRegistry {
    pub fn new(routes: Arc<dyn RouteStore>) -> Self {
        Self { routes }
    }

    pub async fn add(
        &self,
        origin: &str,
        destination: &str,
        distance_km: f64,
        duration_minutes: u32,
        fare_multiplier: f64,
    ) -> Result<Route, FleetError> {
        if origin.trim().is_empty() || destination.trim().is_empty() {
            return Err(FleetError::InvalidInput("origin and destination must not be empty"));
        }
        if distance_km <= 0.0 {
            return Err(FleetError::InvalidInput("distance must be positive"));
        }
        if fare_multiplier <= 0.0 {
            return Err(FleetError::InvalidInput("fare multiplier must be positive"));
        }

        let route = Route::new(
            origin.trim(),
            destination.trim(),
            distance_km,
            duration_minutes,
            fare_multiplier,
        );
        self.routes.insert(&route).await?;
        Ok(route)
    }

    pub async fn update(
        &self,
        id: Uuid,
        distance_km: f64,
        duration_minutes: u32,
        fare_multiplier: f64,
    ) -> Result<Route, FleetError> {
        if distance_km <= 0.0 || fare_multiplier <= 0.0 {
            return Err(FleetError::InvalidInput("distance and fare multiplier must be positive"));
        }

        let mut route = self
            .routes
            .find(id)
            .await?
            .ok_or(FleetError::RouteNotFound(id))?;
        route.distance_km = distance_km;
        route.duration_minutes = duration_minutes;
        route.fare_multiplier = fare_multiplier;
        route.updated_at = Utc::now();

        if !self.routes.update(&route).await? {
            return Err(FleetError::RouteNotFound(id));
        }
        Ok(route)
    }

    pub async fn get(&self, id: Uuid) -> Result<Route, FleetError> {
        self.routes
            .find(id)
            .await?
            .ok_or(FleetError::RouteNotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<Route>, FleetError> {
        Ok(self.routes.list().await?)
    }
}

pub struct ScheduleRegistry {
    schedules: Arc<dyn ScheduleStore>,
    buses: Arc<dyn BusStore>,
    routes: Arc<dyn RouteStore>,
}

impl ScheduleRegistry {
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        buses: Arc<dyn BusStore>,
        routes: Arc<dyn RouteStore>,
    ) -> Self {
        Self {
            schedules,
            buses,
            routes,
        }
    }

    pub async fn add(
        &self,
        bus_id: Uuid,
        route_id: Uuid,
        departure: NaiveTime,
        arrival: NaiveTime,
        day_of_week: Weekday,
    ) -> Result<Schedule, FleetError> {
        if self.buses.find(bus_id).await?.is_none() {
            return Err(FleetError::BusNotFound(bus_id));
        }
        if self.routes.find(route_id).await?.is_none() {
            return Err(FleetError::RouteNotFound(route_id));
        }

        let schedule = Schedule::new(bus_id, route_id, departure, arrival, day_of_week);
        self.schedules.insert(&schedule).await?;
        Ok(schedule)
    }

    pub async fn get(&self, id: Uuid) -> Result<Schedule, FleetError> {
        self.schedules
            .find(id)
            .await?
            .ok_or(FleetError::ScheduleNotFound(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), FleetError> {
        if !self.schedules.remove(id).await? {
            return Err(FleetError::ScheduleNotFound(id));
        }
        Ok(())
    }

    pub async fn list_for_bus(&self, bus_id: Uuid) -> Result<Vec<Schedule>, FleetError> {
        Ok(self.schedules.list_for_bus(bus_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBusStore, MemoryRouteStore, MemoryScheduleStore};
    use async_trait::async_trait;
    use motus_core::StoreResult;

    struct NoBookings;

    #[async_trait]
    impl ConfirmedBookingProbe for NoBookings {
        async fn has_confirmed_for_bus(&self, _bus_id: Uuid) -> StoreResult<bool> {
            Ok(false)
        }
    }

    struct BusyBus;

    #[async_trait]
    impl ConfirmedBookingProbe for BusyBus {
        async fn has_confirmed_for_bus(&self, _bus_id: Uuid) -> StoreResult<bool> {
            Ok(true)
        }
    }

    fn registry(probe: Arc<dyn ConfirmedBookingProbe>) -> BusRegistry {
        BusRegistry::new(Arc::new(MemoryBusStore::new()), probe)
    }

    #[tokio::test]
    async fn duplicate_bus_numbers_are_rejected() {
        let registry = registry(Arc::new(NoBookings));
        registry
            .add("MH-12-8801", "Deccan Queen", BusCategory::Deluxe, 40, 1000)
            .await
            .unwrap();

        let err = registry
            .add("MH-12-8801", "Imposter", BusCategory::Deluxe, 40, 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::Storage(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn blank_fields_are_invalid() {
        let registry = registry(Arc::new(NoBookings));
        let err = registry
            .add("  ", "Nameless", BusCategory::Ordinary, 30, 500)
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::InvalidInput(_)));

        let err = registry
            .add("KA-01-1", "Zero Seats", BusCategory::Ordinary, 0, 500)
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn delete_is_refused_while_bookings_exist() {
        let registry = registry(Arc::new(BusyBus));
        let bus = registry
            .add("TN-09-4410", "Coast Liner", BusCategory::Luxury, 36, 2500)
            .await
            .unwrap();

        let err = registry.delete(bus.id).await.unwrap_err();
        assert!(matches!(err, FleetError::BusInUse(_)));
    }

    #[tokio::test]
    async fn schedules_require_existing_bus_and_route() {
        let buses = Arc::new(MemoryBusStore::new());
        let routes = Arc::new(MemoryRouteStore::new());
        let schedules = ScheduleRegistry::new(
            Arc::new(MemoryScheduleStore::new()),
            buses.clone(),
            routes.clone(),
        );

        let err = schedules
            .add(
                Uuid::new_v4(),
                Uuid::new_v4(),
                NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
                Weekday::Mon,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::BusNotFound(_)));
    }

    #[tokio::test]
    async fn update_keeps_the_seat_plan() {
        let registry = registry(Arc::new(NoBookings));
        let bus = registry
            .add("KL-07-2210", "Ghat Express", BusCategory::AirConditioned, 44, 1800)
            .await
            .unwrap();

        let updated = registry
            .update(bus.id, "Ghat Express II", BusCategory::Sleeper, 2100, BusStatus::Maintenance)
            .await
            .unwrap();
        assert_eq!(updated.total_seats, 44);
        assert_eq!(updated.category, BusCategory::Sleeper);
        assert_eq!(updated.status, BusStatus::Maintenance);
    }
}
