use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatBookedEvent {
    pub bus_id: Uuid,
    pub seat_number: u32,
    pub travel_date: NaiveDate,
    pub booking_id: Uuid,
    pub occurred_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatReleasedEvent {
    pub bus_id: Uuid,
    pub seat_number: u32,
    pub travel_date: NaiveDate,
    pub booking_id: Uuid,
    pub occurred_at: i64,
}

/// Envelope carried on the in-process broadcast channel and over SSE.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationEvent {
    SeatBooked(SeatBookedEvent),
    SeatReleased(SeatReleasedEvent),
}

impl ReservationEvent {
    pub fn bus_id(&self) -> Uuid {
        match self {
            ReservationEvent::SeatBooked(e) => e.bus_id,
            ReservationEvent::SeatReleased(e) => e.bus_id,
        }
    }
}
