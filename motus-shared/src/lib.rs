pub mod events;
pub mod pii;

pub use events::{ReservationEvent, SeatBookedEvent, SeatReleasedEvent};
pub use pii::Masked;
