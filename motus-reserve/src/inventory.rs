use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use uuid::Uuid;

/// Occupancy of one seat on one travel date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    Available,
    Occupied { booking: Uuid },
    Blocked,
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("bus not registered with inventory: {0}")]
    UnknownBus(Uuid),

    #[error("bus {bus_id} seat plan changed: registered {registered} seats, requested {requested}")]
    CapacityChanged {
        bus_id: Uuid,
        registered: u32,
        requested: u32,
    },

    #[error("seat {seat} out of range, bus has {total} seats")]
    SeatOutOfRange { seat: u32, total: u32 },

    #[error("seat {seat} is not available")]
    SeatUnavailable { seat: u32 },

    #[error("seat {seat} is not occupied")]
    SeatNotOccupied { seat: u32 },

    #[error("seat {seat} is not blocked")]
    SeatNotBlocked { seat: u32 },
}

fn lock_slot(slot: &Mutex<SeatState>) -> MutexGuard<'_, SeatState> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One (bus, travel date) occupancy sheet. Every seat is an independent
/// lock, so transitions on different seats never contend; the available
/// counter moves inside the same critical section as the slot it describes
/// and can never drift from the slot states.
struct SeatSheet {
    slots: Vec<Mutex<SeatState>>,
    available: AtomicU32,
}

impl SeatSheet {
    fn new(total: u32) -> Self {
        Self {
            slots: (0..total).map(|_| Mutex::new(SeatState::Available)).collect(),
            available: AtomicU32::new(total),
        }
    }

    fn total(&self) -> u32 {
        self.slots.len() as u32
    }

    fn slot(&self, seat: u32) -> Result<&Mutex<SeatState>, InventoryError> {
        if seat == 0 || seat as usize > self.slots.len() {
            return Err(InventoryError::SeatOutOfRange {
                seat,
                total: self.total(),
            });
        }
        Ok(&self.slots[(seat - 1) as usize])
    }

    fn seed(&self, confirmed: &[(u32, Uuid)]) {
        for &(seat, booking) in confirmed {
            match self.slot(seat) {
                Ok(slot) => {
                    let mut state = lock_slot(slot);
                    if *state == SeatState::Available {
                        *state = SeatState::Occupied { booking };
                        self.available.fetch_sub(1, Ordering::AcqRel);
                    }
                }
                Err(_) => {
                    tracing::warn!(
                        seat,
                        booking_id = %booking,
                        "confirmed booking references a seat outside the plan, skipping"
                    );
                }
            }
        }
    }
}

/// Authoritative in-process view of seat occupancy, keyed by
/// (bus, travel date). Sheets are materialized lazily and seeded from the
/// ledger's confirmed set, which stays the canonical source of truth.
pub struct SeatInventory {
    capacities: RwLock<HashMap<Uuid, u32>>,
    sheets: RwLock<HashMap<(Uuid, NaiveDate), Arc<SeatSheet>>>,
}

impl SeatInventory {
    pub fn new() -> Self {
        Self {
            capacities: RwLock::new(HashMap::new()),
            sheets: RwLock::new(HashMap::new()),
        }
    }

    /// Idempotent. A bus seat plan is fixed once registered; a different
    /// count is refused so stale sheets cannot silently misreport.
    pub fn register_bus(&self, bus_id: Uuid, total_seats: u32) -> Result<(), InventoryError> {
        let mut capacities = self
            .capacities
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(&registered) = capacities.get(&bus_id) {
            if registered != total_seats {
                return Err(InventoryError::CapacityChanged {
                    bus_id,
                    registered,
                    requested: total_seats,
                });
            }
            return Ok(());
        }
        capacities.insert(bus_id, total_seats);
        Ok(())
    }

    fn capacity(&self, bus_id: Uuid) -> Result<u32, InventoryError> {
        let capacities = self
            .capacities
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        capacities
            .get(&bus_id)
            .copied()
            .ok_or(InventoryError::UnknownBus(bus_id))
    }

    pub fn has_sheet(&self, bus_id: Uuid, date: NaiveDate) -> bool {
        let sheets = self.sheets.read().unwrap_or_else(PoisonError::into_inner);
        sheets.contains_key(&(bus_id, date))
    }

    /// Materialize the sheet for a key, seeding occupancy from the ledger's
    /// confirmed set. No-op when the sheet already exists; creation is
    /// double-checked under the write lock so concurrent callers cannot seed
    /// twice.
    pub fn ensure(
        &self,
        bus_id: Uuid,
        date: NaiveDate,
        confirmed: &[(u32, Uuid)],
    ) -> Result<(), InventoryError> {
        if self.has_sheet(bus_id, date) {
            return Ok(());
        }
        let total = self.capacity(bus_id)?;

        let mut sheets = self.sheets.write().unwrap_or_else(PoisonError::into_inner);
        sheets.entry((bus_id, date)).or_insert_with(|| {
            let sheet = SeatSheet::new(total);
            sheet.seed(confirmed);
            Arc::new(sheet)
        });
        Ok(())
    }

    fn sheet(&self, bus_id: Uuid, date: NaiveDate) -> Result<Arc<SeatSheet>, InventoryError> {
        {
            let sheets = self.sheets.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(sheet) = sheets.get(&(bus_id, date)) {
                return Ok(sheet.clone());
            }
        }
        let total = self.capacity(bus_id)?;
        let mut sheets = self.sheets.write().unwrap_or_else(PoisonError::into_inner);
        Ok(sheets
            .entry((bus_id, date))
            .or_insert_with(|| Arc::new(SeatSheet::new(total)))
            .clone())
    }

    pub fn is_available(
        &self,
        bus_id: Uuid,
        seat: u32,
        date: NaiveDate,
    ) -> Result<bool, InventoryError> {
        let sheet = self.sheet(bus_id, date)?;
        let slot = sheet.slot(seat)?;
        let state = lock_slot(slot);
        Ok(*state == SeatState::Available)
    }

    /// Atomic conditional transition Available -> Occupied. The check and
    /// the flip happen under the slot lock; there is no window for a second
    /// caller to observe Available.
    pub fn occupy(
        &self,
        bus_id: Uuid,
        seat: u32,
        date: NaiveDate,
        booking: Uuid,
    ) -> Result<(), InventoryError> {
        let sheet = self.sheet(bus_id, date)?;
        let slot = sheet.slot(seat)?;
        let mut state = lock_slot(slot);
        match *state {
            SeatState::Available => {
                *state = SeatState::Occupied { booking };
                sheet.available.fetch_sub(1, Ordering::AcqRel);
                Ok(())
            }
            _ => Err(InventoryError::SeatUnavailable { seat }),
        }
    }

    /// Occupied -> Available; returns the booking that held the seat.
    pub fn release(
        &self,
        bus_id: Uuid,
        seat: u32,
        date: NaiveDate,
    ) -> Result<Uuid, InventoryError> {
        let sheet = self.sheet(bus_id, date)?;
        let slot = sheet.slot(seat)?;
        let mut state = lock_slot(slot);
        match *state {
            SeatState::Occupied { booking } => {
                *state = SeatState::Available;
                sheet.available.fetch_add(1, Ordering::AcqRel);
                Ok(booking)
            }
            _ => Err(InventoryError::SeatNotOccupied { seat }),
        }
    }

    /// Take a seat out of sale for one travel date. Idempotent; refuses to
    /// block a seat somebody already holds.
    pub fn block(&self, bus_id: Uuid, seat: u32, date: NaiveDate) -> Result<(), InventoryError> {
        let sheet = self.sheet(bus_id, date)?;
        let slot = sheet.slot(seat)?;
        let mut state = lock_slot(slot);
        match *state {
            SeatState::Available => {
                *state = SeatState::Blocked;
                sheet.available.fetch_sub(1, Ordering::AcqRel);
                Ok(())
            }
            SeatState::Blocked => Ok(()),
            SeatState::Occupied { .. } => Err(InventoryError::SeatUnavailable { seat }),
        }
    }

    pub fn unblock(&self, bus_id: Uuid, seat: u32, date: NaiveDate) -> Result<(), InventoryError> {
        let sheet = self.sheet(bus_id, date)?;
        let slot = sheet.slot(seat)?;
        let mut state = lock_slot(slot);
        match *state {
            SeatState::Blocked => {
                *state = SeatState::Available;
                sheet.available.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            _ => Err(InventoryError::SeatNotBlocked { seat }),
        }
    }

    pub fn available_count(&self, bus_id: Uuid, date: NaiveDate) -> Result<u32, InventoryError> {
        let sheet = self.sheet(bus_id, date)?;
        Ok(sheet.available.load(Ordering::Acquire))
    }

    /// Seat layout in seat-number order, for rendering.
    pub fn snapshot(
        &self,
        bus_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<(u32, SeatState)>, InventoryError> {
        let sheet = self.sheet(bus_id, date)?;
        Ok(sheet
            .slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| (idx as u32 + 1, *lock_slot(slot)))
            .collect())
    }

    /// Recovery path: re-derive the sheet from the ledger's confirmed set.
    /// Blocked seats are operator state, not ledger state, and survive the
    /// rebuild. Assumes no concurrent writers for the key.
    pub fn rebuild(
        &self,
        bus_id: Uuid,
        date: NaiveDate,
        confirmed: &[(u32, Uuid)],
    ) -> Result<(), InventoryError> {
        let sheet = self.sheet(bus_id, date)?;
        let by_seat: HashMap<u32, Uuid> = confirmed.iter().copied().collect();

        let mut available = 0u32;
        for (idx, slot) in sheet.slots.iter().enumerate() {
            let seat = idx as u32 + 1;
            let mut state = lock_slot(slot);
            *state = match (*state, by_seat.get(&seat)) {
                (SeatState::Blocked, _) => SeatState::Blocked,
                (_, Some(&booking)) => SeatState::Occupied { booking },
                (_, None) => SeatState::Available,
            };
            if *state == SeatState::Available {
                available += 1;
            }
        }
        sheet.available.store(available, Ordering::Release);
        Ok(())
    }
}

impl Default for SeatInventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn inventory(total: u32) -> (SeatInventory, Uuid) {
        let inv = SeatInventory::new();
        let bus = Uuid::new_v4();
        inv.register_bus(bus, total).unwrap();
        (inv, bus)
    }

    #[test]
    fn occupy_release_roundtrip_keeps_the_count() {
        let (inv, bus) = inventory(3);
        let booking = Uuid::new_v4();

        assert!(inv.is_available(bus, 2, date()).unwrap());
        inv.occupy(bus, 2, date(), booking).unwrap();
        assert!(!inv.is_available(bus, 2, date()).unwrap());
        assert_eq!(inv.available_count(bus, date()).unwrap(), 2);

        let released = inv.release(bus, 2, date()).unwrap();
        assert_eq!(released, booking);
        assert_eq!(inv.available_count(bus, date()).unwrap(), 3);
    }

    #[test]
    fn double_occupy_is_refused() {
        let (inv, bus) = inventory(3);
        inv.occupy(bus, 1, date(), Uuid::new_v4()).unwrap();
        let err = inv.occupy(bus, 1, date(), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, InventoryError::SeatUnavailable { seat: 1 }));
        assert_eq!(inv.available_count(bus, date()).unwrap(), 2);
    }

    #[test]
    fn seat_numbers_are_one_based_and_bounded() {
        let (inv, bus) = inventory(3);
        assert!(matches!(
            inv.is_available(bus, 0, date()).unwrap_err(),
            InventoryError::SeatOutOfRange { seat: 0, total: 3 }
        ));
        assert!(matches!(
            inv.occupy(bus, 4, date(), Uuid::new_v4()).unwrap_err(),
            InventoryError::SeatOutOfRange { seat: 4, total: 3 }
        ));
    }

    #[test]
    fn release_without_occupation_fails() {
        let (inv, bus) = inventory(3);
        assert!(matches!(
            inv.release(bus, 1, date()).unwrap_err(),
            InventoryError::SeatNotOccupied { seat: 1 }
        ));
    }

    #[test]
    fn dates_are_independent() {
        let (inv, bus) = inventory(2);
        let other = NaiveDate::from_ymd_opt(2024, 6, 8).unwrap();
        inv.occupy(bus, 1, date(), Uuid::new_v4()).unwrap();

        assert!(inv.is_available(bus, 1, other).unwrap());
        assert_eq!(inv.available_count(bus, date()).unwrap(), 1);
        assert_eq!(inv.available_count(bus, other).unwrap(), 2);
    }

    #[test]
    fn blocked_seats_are_out_of_sale() {
        let (inv, bus) = inventory(3);
        inv.block(bus, 3, date()).unwrap();
        assert!(!inv.is_available(bus, 3, date()).unwrap());
        assert_eq!(inv.available_count(bus, date()).unwrap(), 2);
        assert!(matches!(
            inv.occupy(bus, 3, date(), Uuid::new_v4()).unwrap_err(),
            InventoryError::SeatUnavailable { seat: 3 }
        ));

        // Idempotent block, then back on sale.
        inv.block(bus, 3, date()).unwrap();
        assert_eq!(inv.available_count(bus, date()).unwrap(), 2);
        inv.unblock(bus, 3, date()).unwrap();
        assert_eq!(inv.available_count(bus, date()).unwrap(), 3);
    }

    #[test]
    fn blocking_an_occupied_seat_is_refused() {
        let (inv, bus) = inventory(3);
        inv.occupy(bus, 2, date(), Uuid::new_v4()).unwrap();
        assert!(matches!(
            inv.block(bus, 2, date()).unwrap_err(),
            InventoryError::SeatUnavailable { seat: 2 }
        ));
    }

    #[test]
    fn ensure_seeds_from_the_confirmed_set() {
        let (inv, bus) = inventory(4);
        let booking = Uuid::new_v4();
        inv.ensure(bus, date(), &[(2, booking)]).unwrap();

        assert!(!inv.is_available(bus, 2, date()).unwrap());
        assert_eq!(inv.available_count(bus, date()).unwrap(), 3);

        // Second ensure with a different seed is a no-op: the sheet exists.
        inv.ensure(bus, date(), &[(3, Uuid::new_v4())]).unwrap();
        assert!(inv.is_available(bus, 3, date()).unwrap());
    }

    #[test]
    fn rebuild_rederives_occupancy_and_keeps_blocks() {
        let (inv, bus) = inventory(4);
        let stale = Uuid::new_v4();
        let kept = Uuid::new_v4();
        inv.occupy(bus, 1, date(), stale).unwrap();
        inv.occupy(bus, 2, date(), kept).unwrap();
        inv.block(bus, 4, date()).unwrap();

        // The ledger says only seat 2 is really confirmed.
        inv.rebuild(bus, date(), &[(2, kept)]).unwrap();

        let layout = inv.snapshot(bus, date()).unwrap();
        assert_eq!(layout[0].1, SeatState::Available);
        assert_eq!(layout[1].1, SeatState::Occupied { booking: kept });
        assert_eq!(layout[3].1, SeatState::Blocked);
        assert_eq!(inv.available_count(bus, date()).unwrap(), 2);
    }

    #[test]
    fn seat_plan_changes_are_refused() {
        let (inv, bus) = inventory(3);
        inv.register_bus(bus, 3).unwrap();
        assert!(matches!(
            inv.register_bus(bus, 5).unwrap_err(),
            InventoryError::CapacityChanged { registered: 3, requested: 5, .. }
        ));
    }

    #[test]
    fn unregistered_bus_is_an_error() {
        let inv = SeatInventory::new();
        assert!(matches!(
            inv.available_count(Uuid::new_v4(), date()).unwrap_err(),
            InventoryError::UnknownBus(_)
        ));
    }
}
