use chrono::{DateTime, NaiveDate, Utc};
use motus_shared::pii::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse_lossy(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "CONFIRMED" => BookingStatus::Confirmed,
            "CANCELLED" => BookingStatus::Cancelled,
            "COMPLETED" => BookingStatus::Completed,
            other => {
                tracing::warn!(
                    label = other,
                    "unknown booking status label, treating as CANCELLED"
                );
                BookingStatus::Cancelled
            }
        }
    }
}

/// The durable reservation record. Created CONFIRMED by the coordinator;
/// CANCELLED only through explicit cancellation; COMPLETED only by the
/// post-travel sweep. Both terminal states are immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bus_id: Uuid,
    pub schedule_id: Uuid,
    pub seat_number: u32,
    pub passenger_name: String,
    pub passenger_phone: Masked,
    pub fare_cents: i64,
    pub status: BookingStatus,
    pub booked_at: DateTime<Utc>,
    pub travel_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn confirmed(candidate: BookingCandidate, fare_cents: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: candidate.user_id,
            bus_id: candidate.bus_id,
            schedule_id: candidate.schedule_id,
            seat_number: candidate.seat_number,
            passenger_name: candidate.passenger_name,
            passenger_phone: candidate.passenger_phone,
            fare_cents,
            status: BookingStatus::Confirmed,
            booked_at: now,
            travel_date: candidate.travel_date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

/// Everything the ledger needs to mint a booking, minus the fare (computed
/// by the coordinator) and the identity/stamps (assigned at record time).
#[derive(Debug, Clone)]
pub struct BookingCandidate {
    pub user_id: Uuid,
    pub bus_id: Uuid,
    pub schedule_id: Uuid,
    pub seat_number: u32,
    pub passenger_name: String,
    pub passenger_phone: Masked,
    pub travel_date: NaiveDate,
}
