use chrono::{NaiveDate, Utc};
use motus_core::StoreError;
use motus_shared::pii::Masked;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Booking, BookingCandidate, BookingStatus};
use crate::repository::BookingStore;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("booking not found: {0}")]
    NotFound(Uuid),

    #[error("booking already cancelled: {0}")]
    AlreadyCancelled(Uuid),

    #[error("booking already completed: {0}")]
    AlreadyCompleted(Uuid),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// The booking ledger: status transitions and queries over the durable
/// booking set. Cancellation is the only status mutation exposed; the hard
/// delete exists solely for the coordinator's rollback.
pub struct BookingLedger {
    store: Arc<dyn BookingStore>,
}

impl BookingLedger {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        candidate: BookingCandidate,
        fare_cents: i64,
    ) -> Result<Booking, LedgerError> {
        let booking = Booking::confirmed(candidate, fare_cents);
        self.store.insert(&booking).await?;
        tracing::info!(
            booking_id = %booking.id,
            bus_id = %booking.bus_id,
            seat = booking.seat_number,
            travel_date = %booking.travel_date,
            "booking recorded"
        );
        Ok(booking)
    }

    pub async fn find(&self, id: Uuid) -> Result<Booking, LedgerError> {
        self.store
            .find(id)
            .await?
            .ok_or(LedgerError::NotFound(id))
    }

    pub async fn by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, LedgerError> {
        Ok(self.store.find_by_user(user_id).await?)
    }

    pub async fn by_bus(&self, bus_id: Uuid) -> Result<Vec<Booking>, LedgerError> {
        Ok(self.store.find_by_bus(bus_id).await?)
    }

    /// CONFIRMED -> CANCELLED. The transition itself is a conditional write
    /// in the store; when it reports no effect the current status is
    /// re-read so a lost race still surfaces the precise reason.
    pub async fn cancel(&self, id: Uuid) -> Result<Booking, LedgerError> {
        let booking = self.find(id).await?;
        match booking.status {
            BookingStatus::Cancelled => return Err(LedgerError::AlreadyCancelled(id)),
            BookingStatus::Completed => return Err(LedgerError::AlreadyCompleted(id)),
            BookingStatus::Confirmed => {}
        }

        let now = Utc::now();
        if self.store.mark_cancelled(id, now).await? {
            tracing::info!(booking_id = %id, "booking cancelled");
            return self.find(id).await;
        }

        // Lost the race against another cancellation or the completion sweep.
        match self.store.find(id).await? {
            Some(b) if b.status == BookingStatus::Cancelled => Err(LedgerError::AlreadyCancelled(id)),
            Some(b) if b.status == BookingStatus::Completed => Err(LedgerError::AlreadyCompleted(id)),
            Some(_) | None => Err(LedgerError::NotFound(id)),
        }
    }

    /// Passenger contact fix-up, allowed only while CONFIRMED.
    pub async fn update_contact(
        &self,
        id: Uuid,
        passenger_name: &str,
        passenger_phone: &Masked,
    ) -> Result<Booking, LedgerError> {
        let booking = self.find(id).await?;
        match booking.status {
            BookingStatus::Cancelled => return Err(LedgerError::AlreadyCancelled(id)),
            BookingStatus::Completed => return Err(LedgerError::AlreadyCompleted(id)),
            BookingStatus::Confirmed => {}
        }

        if !self
            .store
            .update_contact(id, passenger_name, passenger_phone, Utc::now())
            .await?
        {
            return Err(LedgerError::NotFound(id));
        }
        self.find(id).await
    }

    /// Rollback of a record that never became a completed reservation. Not
    /// part of the public cancellation path.
    pub async fn discard(&self, id: Uuid) -> Result<(), LedgerError> {
        if self.store.remove(id).await? {
            tracing::warn!(booking_id = %id, "booking discarded during reservation rollback");
        }
        Ok(())
    }

    pub async fn confirmed_seats(
        &self,
        bus_id: Uuid,
        travel_date: NaiveDate,
    ) -> Result<Vec<(u32, Uuid)>, LedgerError> {
        Ok(self.store.confirmed_seats(bus_id, travel_date).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBookingStore;

    fn candidate(user_id: Uuid, bus_id: Uuid, seat: u32) -> BookingCandidate {
        BookingCandidate {
            user_id,
            bus_id,
            schedule_id: Uuid::new_v4(),
            seat_number: seat,
            passenger_name: "Meera Joshi".to_string(),
            passenger_phone: Masked::new("555-0142"),
            travel_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        }
    }

    fn ledger() -> BookingLedger {
        BookingLedger::new(Arc::new(MemoryBookingStore::new()))
    }

    #[tokio::test]
    async fn record_assigns_identity_and_confirms() {
        let ledger = ledger();
        let booking = ledger
            .record(candidate(Uuid::new_v4(), Uuid::new_v4(), 3), 1200)
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.fare_cents, 1200);
        let found = ledger.find(booking.id).await.unwrap();
        assert_eq!(found.seat_number, 3);
    }

    #[tokio::test]
    async fn cancel_is_single_shot() {
        let ledger = ledger();
        let booking = ledger
            .record(candidate(Uuid::new_v4(), Uuid::new_v4(), 1), 800)
            .await
            .unwrap();

        let cancelled = ledger.cancel(booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let err = ledger.cancel(booking.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::AlreadyCancelled(_)));
    }

    #[tokio::test]
    async fn completed_bookings_cannot_be_cancelled_or_edited() {
        let store = Arc::new(MemoryBookingStore::new());
        let ledger = BookingLedger::new(store.clone());

        let mut booking =
            Booking::confirmed(candidate(Uuid::new_v4(), Uuid::new_v4(), 2), 1000);
        booking.status = BookingStatus::Completed;
        store.insert(&booking).await.unwrap();

        assert!(matches!(
            ledger.cancel(booking.id).await.unwrap_err(),
            LedgerError::AlreadyCompleted(_)
        ));
        assert!(matches!(
            ledger
                .update_contact(booking.id, "New Name", &Masked::new("555-0000"))
                .await
                .unwrap_err(),
            LedgerError::AlreadyCompleted(_)
        ));
    }

    #[tokio::test]
    async fn by_user_returns_most_recent_first() {
        let ledger = ledger();
        let user = Uuid::new_v4();
        let bus = Uuid::new_v4();

        let first = ledger.record(candidate(user, bus, 1), 500).await.unwrap();
        let second = ledger.record(candidate(user, bus, 2), 500).await.unwrap();
        let third = ledger.record(candidate(user, bus, 3), 500).await.unwrap();

        let mine = ledger.by_user(user).await.unwrap();
        assert_eq!(
            mine.iter().map(|b| b.id).collect::<Vec<_>>(),
            vec![third.id, second.id, first.id]
        );
    }

    #[tokio::test]
    async fn contact_update_touches_only_contact_fields() {
        let ledger = ledger();
        let booking = ledger
            .record(candidate(Uuid::new_v4(), Uuid::new_v4(), 4), 1500)
            .await
            .unwrap();

        let updated = ledger
            .update_contact(booking.id, "M. Joshi", &Masked::new("555-0199"))
            .await
            .unwrap();
        assert_eq!(updated.passenger_name, "M. Joshi");
        assert_eq!(updated.passenger_phone.as_str(), "555-0199");
        assert_eq!(updated.fare_cents, 1500);
        assert_eq!(updated.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn confirmed_seats_excludes_cancelled() {
        let ledger = ledger();
        let bus = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let keep = ledger.record(candidate(Uuid::new_v4(), bus, 1), 500).await.unwrap();
        let drop = ledger.record(candidate(Uuid::new_v4(), bus, 2), 500).await.unwrap();
        ledger.cancel(drop.id).await.unwrap();

        let seats = ledger.confirmed_seats(bus, date).await.unwrap();
        assert_eq!(seats, vec![(1, keep.id)]);
    }
}
