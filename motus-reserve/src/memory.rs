//! HashMap-backed booking store for tests and single-node deployments.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use motus_core::StoreResult;
use motus_fleet::repository::ConfirmedBookingProbe;
use motus_shared::pii::Masked;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use crate::models::{Booking, BookingStatus};
use crate::repository::BookingStore;

struct Stored {
    booking: Booking,
    seq: u64,
}

struct Inner {
    rows: HashMap<Uuid, Stored>,
    next_seq: u64,
}

pub struct MemoryBookingStore {
    inner: Mutex<Inner>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                rows: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    fn collect_sorted(inner: &Inner, mut keep: impl FnMut(&Booking) -> bool) -> Vec<Booking> {
        let mut rows: Vec<(u64, Booking)> = inner
            .rows
            .values()
            .filter(|s| keep(&s.booking))
            .map(|s| (s.seq, s.booking.clone()))
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.into_iter().map(|(_, b)| b).collect()
    }
}

impl Default for MemoryBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn insert(&self, booking: &Booking) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.rows.insert(
            booking.id,
            Stored {
                booking: booking.clone(),
                seq,
            },
        );
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.rows.get(&id).map(|s| s.booking.clone()))
    }

    async fn find_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Self::collect_sorted(&inner, |b| b.user_id == user_id))
    }

    async fn find_by_bus(&self, bus_id: Uuid) -> StoreResult<Vec<Booking>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Self::collect_sorted(&inner, |b| b.bus_id == bus_id))
    }

    async fn mark_cancelled(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match inner.rows.get_mut(&id) {
            Some(stored) if stored.booking.status == BookingStatus::Confirmed => {
                stored.booking.status = BookingStatus::Cancelled;
                stored.booking.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_contact(
        &self,
        id: Uuid,
        passenger_name: &str,
        passenger_phone: &Masked,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match inner.rows.get_mut(&id) {
            Some(stored) if stored.booking.status == BookingStatus::Confirmed => {
                stored.booking.passenger_name = passenger_name.to_string();
                stored.booking.passenger_phone = passenger_phone.clone();
                stored.booking.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.rows.remove(&id).is_some())
    }

    async fn confirmed_seats(
        &self,
        bus_id: Uuid,
        travel_date: NaiveDate,
    ) -> StoreResult<Vec<(u32, Uuid)>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut seats: Vec<(u32, Uuid)> = inner
            .rows
            .values()
            .filter(|s| {
                s.booking.bus_id == bus_id
                    && s.booking.travel_date == travel_date
                    && s.booking.status == BookingStatus::Confirmed
            })
            .map(|s| (s.booking.seat_number, s.booking.id))
            .collect();
        seats.sort_by_key(|&(seat, _)| seat);
        Ok(seats)
    }
}

#[async_trait]
impl ConfirmedBookingProbe for MemoryBookingStore {
    async fn has_confirmed_for_bus(&self, bus_id: Uuid) -> StoreResult<bool> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .rows
            .values()
            .any(|s| s.booking.bus_id == bus_id && s.booking.status == BookingStatus::Confirmed))
    }
}
