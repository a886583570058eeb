use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use motus_core::StoreResult;
use motus_shared::pii::Masked;
use uuid::Uuid;

use crate::models::Booking;

/// Durable record of booking attempts. Implementations must make `insert`
/// all-or-nothing and `mark_cancelled` a storage-level conditional write, so
/// two racing cancellations cannot both report success.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: &Booking) -> StoreResult<()>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Most recent first.
    async fn find_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>>;

    /// Most recent first.
    async fn find_by_bus(&self, bus_id: Uuid) -> StoreResult<Vec<Booking>>;

    /// CONFIRMED -> CANCELLED, conditional on the current status. Returns
    /// false when the booking is missing or not CONFIRMED.
    async fn mark_cancelled(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Passenger contact update, conditional on CONFIRMED.
    async fn update_contact(
        &self,
        id: Uuid,
        passenger_name: &str,
        passenger_phone: &Masked,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Hard delete. Only the coordinator's mid-transaction rollback may use
    /// this; cancellation never deletes.
    async fn remove(&self, id: Uuid) -> StoreResult<bool>;

    /// The canonical confirmed set for one (bus, travel date) key, as
    /// (seat_number, booking_id) pairs.
    async fn confirmed_seats(
        &self,
        bus_id: Uuid,
        travel_date: NaiveDate,
    ) -> StoreResult<Vec<(u32, Uuid)>>;
}
