//! HashMap-backed fleet stores for tests and single-node deployments.

use async_trait::async_trait;
use motus_core::{StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::bus::Bus;
use crate::repository::{BusStore, RouteStore, ScheduleStore};
use crate::route::Route;
use crate::schedule::Schedule;

pub struct MemoryBusStore {
    buses: Mutex<HashMap<Uuid, Bus>>,
}

impl MemoryBusStore {
    pub fn new() -> Self {
        Self {
            buses: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryBusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusStore for MemoryBusStore {
    async fn insert(&self, bus: &Bus) -> StoreResult<()> {
        let mut buses = self.buses.lock().unwrap_or_else(|e| e.into_inner());
        if buses.values().any(|b| b.number == bus.number && b.id != bus.id) {
            return Err(StoreError::conflict(format!(
                "bus number already registered: {}",
                bus.number
            )));
        }
        buses.insert(bus.id, bus.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Bus>> {
        let buses = self.buses.lock().unwrap_or_else(|e| e.into_inner());
        Ok(buses.get(&id).cloned())
    }

    async fn find_by_number(&self, number: &str) -> StoreResult<Option<Bus>> {
        let buses = self.buses.lock().unwrap_or_else(|e| e.into_inner());
        Ok(buses.values().find(|b| b.number == number).cloned())
    }

    async fn update(&self, bus: &Bus) -> StoreResult<bool> {
        let mut buses = self.buses.lock().unwrap_or_else(|e| e.into_inner());
        if buses.values().any(|b| b.number == bus.number && b.id != bus.id) {
            return Err(StoreError::conflict(format!(
                "bus number already registered: {}",
                bus.number
            )));
        }
        Ok(buses.insert(bus.id, bus.clone()).is_some())
    }

    async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        let mut buses = self.buses.lock().unwrap_or_else(|e| e.into_inner());
        Ok(buses.remove(&id).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<Bus>> {
        let buses = self.buses.lock().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<Bus> = buses.values().cloned().collect();
        all.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(all)
    }

    async fn list_active(&self) -> StoreResult<Vec<Bus>> {
        let mut active: Vec<Bus> = self.list().await?;
        active.retain(|b| b.is_active());
        Ok(active)
    }
}

pub struct MemoryRouteStore {
    routes: Mutex<HashMap<Uuid, Route>>,
}

impl MemoryRouteStore {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryRouteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RouteStore for MemoryRouteStore {
    async fn insert(&self, route: &Route) -> StoreResult<()> {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        routes.insert(route.id, route.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Route>> {
        let routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        Ok(routes.get(&id).cloned())
    }

    async fn update(&self, route: &Route) -> StoreResult<bool> {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        Ok(routes.insert(route.id, route.clone()).is_some())
    }

    async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        Ok(routes.remove(&id).is_some())
    }

    async fn list(&self) -> StoreResult<Vec<Route>> {
        let routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<Route> = routes.values().cloned().collect();
        all.sort_by(|a, b| (&a.origin, &a.destination).cmp(&(&b.origin, &b.destination)));
        Ok(all)
    }
}

pub struct MemoryScheduleStore {
    schedules: Mutex<HashMap<Uuid, Schedule>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self {
            schedules: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryScheduleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn insert(&self, schedule: &Schedule) -> StoreResult<()> {
        let mut schedules = self.schedules.lock().unwrap_or_else(|e| e.into_inner());
        schedules.insert(schedule.id, schedule.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Schedule>> {
        let schedules = self.schedules.lock().unwrap_or_else(|e| e.into_inner());
        Ok(schedules.get(&id).cloned())
    }

    async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        let mut schedules = self.schedules.lock().unwrap_or_else(|e| e.into_inner());
        Ok(schedules.remove(&id).is_some())
    }

    async fn list_for_bus(&self, bus_id: Uuid) -> StoreResult<Vec<Schedule>> {
        let schedules = self.schedules.lock().unwrap_or_else(|e| e.into_inner());
        let mut matching: Vec<Schedule> = schedules
            .values()
            .filter(|s| s.bus_id == bus_id)
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.departure);
        Ok(matching)
    }
}
