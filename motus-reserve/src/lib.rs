pub mod coordinator;
pub mod inventory;
pub mod ledger;
pub mod memory;
pub mod models;
pub mod repository;

pub use coordinator::{CancelError, ReservationCoordinator, ReserveError, ReserveRequest};
pub use inventory::{InventoryError, SeatInventory, SeatState};
pub use ledger::{BookingLedger, LedgerError};
pub use memory::MemoryBookingStore;
pub use models::{Booking, BookingCandidate, BookingStatus};
pub use repository::BookingStore;
