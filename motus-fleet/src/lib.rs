pub mod bus;
pub mod fares;
pub mod memory;
pub mod registry;
pub mod repository;
pub mod route;
pub mod schedule;

pub use bus::{Bus, BusCategory, BusStatus};
pub use fares::FareCalculator;
pub use memory::{MemoryBusStore, MemoryRouteStore, MemoryScheduleStore};
pub use registry::{BusRegistry, FleetError, RouteRegistry, ScheduleRegistry};
pub use repository::{BusStore, ConfirmedBookingProbe, RouteStore, ScheduleStore};
pub use route::Route;
pub use schedule::Schedule;
