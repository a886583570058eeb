use chrono::{NaiveDate, Utc};
use motus_core::identity::UserStore;
use motus_core::StoreError;
use motus_fleet::bus::Bus;
use motus_fleet::fares::FareCalculator;
use motus_fleet::repository::{BusStore, RouteStore, ScheduleStore};
use motus_shared::events::{ReservationEvent, SeatBookedEvent, SeatReleasedEvent};
use motus_shared::pii::Masked;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::inventory::{InventoryError, SeatInventory, SeatState};
use crate::ledger::{BookingLedger, LedgerError};
use crate::models::{Booking, BookingCandidate};

#[derive(Debug, Clone)]
pub struct ReserveRequest {
    pub user_id: Uuid,
    pub bus_id: Uuid,
    pub schedule_id: Uuid,
    pub seat_number: u32,
    pub passenger_name: String,
    pub passenger_phone: Masked,
    pub travel_date: NaiveDate,
}

#[derive(Debug, thiserror::Error)]
pub enum ReserveError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    #[error("bus not found: {0}")]
    BusNotFound(Uuid),

    #[error("schedule not found: {0}")]
    ScheduleNotFound(Uuid),

    #[error("route not found: {0}")]
    RouteNotFound(Uuid),

    #[error("bus is not scheduled to run on {date}")]
    NotScheduled { date: NaiveDate },

    #[error("seat {seat} out of range, bus has {total} seats")]
    SeatOutOfRange { seat: u32, total: u32 },

    #[error("seat {seat} is not available")]
    SeatUnavailable { seat: u32 },

    #[error("seat plan for bus {0} changed, inventory must be rebuilt")]
    SeatPlanChanged(Uuid),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum CancelError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    #[error("booking belongs to another user")]
    NotOwner,

    #[error("booking already cancelled: {0}")]
    AlreadyCancelled(Uuid),

    #[error("booking already completed: {0}")]
    AlreadyCompleted(Uuid),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

fn map_inventory(err: InventoryError) -> ReserveError {
    match err {
        InventoryError::SeatOutOfRange { seat, total } => ReserveError::SeatOutOfRange { seat, total },
        InventoryError::SeatUnavailable { seat } => ReserveError::SeatUnavailable { seat },
        InventoryError::CapacityChanged { bus_id, .. } => ReserveError::SeatPlanChanged(bus_id),
        InventoryError::UnknownBus(id) => ReserveError::BusNotFound(id),
        other => ReserveError::Storage(StoreError::backend(other)),
    }
}

fn storage_of(err: LedgerError) -> StoreError {
    match err {
        LedgerError::Storage(e) => e,
        other => StoreError::backend(other),
    }
}

impl From<LedgerError> for CancelError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(id) => CancelError::BookingNotFound(id),
            LedgerError::AlreadyCancelled(id) => CancelError::AlreadyCancelled(id),
            LedgerError::AlreadyCompleted(id) => CancelError::AlreadyCompleted(id),
            LedgerError::Storage(e) => CancelError::Storage(e),
        }
    }
}

/// The only component allowed to touch the booking ledger and the seat
/// inventory together. Store handles are constructed at startup and passed
/// in; nothing here reaches through a global.
pub struct ReservationCoordinator {
    users: Arc<dyn UserStore>,
    buses: Arc<dyn BusStore>,
    routes: Arc<dyn RouteStore>,
    schedules: Arc<dyn ScheduleStore>,
    ledger: BookingLedger,
    inventory: Arc<SeatInventory>,
    fares: FareCalculator,
    events: broadcast::Sender<ReservationEvent>,
}

impl ReservationCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserStore>,
        buses: Arc<dyn BusStore>,
        routes: Arc<dyn RouteStore>,
        schedules: Arc<dyn ScheduleStore>,
        ledger: BookingLedger,
        inventory: Arc<SeatInventory>,
        fares: FareCalculator,
        events: broadcast::Sender<ReservationEvent>,
    ) -> Self {
        Self {
            users,
            buses,
            routes,
            schedules,
            ledger,
            inventory,
            fares,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReservationEvent> {
        self.events.subscribe()
    }

    /// Register the bus with the inventory and materialize the sheet for the
    /// travel date, seeded from the ledger's confirmed set.
    async fn ensure_sheet(&self, bus: &Bus, date: NaiveDate) -> Result<(), ReserveError> {
        self.inventory
            .register_bus(bus.id, bus.total_seats)
            .map_err(map_inventory)?;
        if !self.inventory.has_sheet(bus.id, date) {
            let confirmed = self
                .ledger
                .confirmed_seats(bus.id, date)
                .await
                .map_err(storage_of)?;
            self.inventory
                .ensure(bus.id, date, &confirmed)
                .map_err(map_inventory)?;
        }
        Ok(())
    }

    async fn resolve_bus(&self, bus_id: Uuid) -> Result<Bus, ReserveError> {
        self.buses
            .find(bus_id)
            .await?
            .ok_or(ReserveError::BusNotFound(bus_id))
    }

    pub async fn reserve(&self, req: ReserveRequest) -> Result<Booking, ReserveError> {
        if req.passenger_name.trim().is_empty() {
            return Err(ReserveError::InvalidInput("passenger name must not be empty"));
        }
        if req.passenger_phone.as_str().trim().is_empty() {
            return Err(ReserveError::InvalidInput("passenger phone must not be empty"));
        }

        self.users
            .find(req.user_id)
            .await?
            .ok_or(ReserveError::UserNotFound(req.user_id))?;
        let bus = self.resolve_bus(req.bus_id).await?;
        let schedule = self
            .schedules
            .find(req.schedule_id)
            .await?
            .ok_or(ReserveError::ScheduleNotFound(req.schedule_id))?;
        if schedule.bus_id != bus.id {
            return Err(ReserveError::InvalidInput("schedule does not serve this bus"));
        }
        if !schedule.runs_on(req.travel_date) {
            return Err(ReserveError::NotScheduled {
                date: req.travel_date,
            });
        }
        let route = self
            .routes
            .find(schedule.route_id)
            .await?
            .ok_or(ReserveError::RouteNotFound(schedule.route_id))?;

        let fare_cents = self
            .fares
            .quote(bus.base_fare_cents, bus.category, route.fare_multiplier);

        self.ensure_sheet(&bus, req.travel_date).await?;

        if !self
            .inventory
            .is_available(bus.id, req.seat_number, req.travel_date)
            .map_err(map_inventory)?
        {
            return Err(ReserveError::SeatUnavailable {
                seat: req.seat_number,
            });
        }

        let candidate = BookingCandidate {
            user_id: req.user_id,
            bus_id: bus.id,
            schedule_id: schedule.id,
            seat_number: req.seat_number,
            passenger_name: req.passenger_name.trim().to_string(),
            passenger_phone: req.passenger_phone.clone(),
            travel_date: req.travel_date,
        };
        let booking = match self.ledger.record(candidate, fare_cents).await {
            Ok(b) => b,
            // The storage backstop (partial unique index) lost us the seat:
            // another process confirmed it first. Nothing to roll back.
            Err(LedgerError::Storage(StoreError::Conflict(_))) => {
                return Err(ReserveError::SeatUnavailable {
                    seat: req.seat_number,
                })
            }
            Err(e) => return Err(ReserveError::Storage(storage_of(e))),
        };

        if let Err(occupy_err) =
            self.inventory
                .occupy(bus.id, req.seat_number, req.travel_date, booking.id)
        {
            // A race let a second reservation through the availability check.
            // Compensate: delete the just-written ledger record, then lose.
            if let Err(rollback_err) = self.ledger.discard(booking.id).await {
                tracing::error!(
                    booking_id = %booking.id,
                    error = %rollback_err,
                    "rollback after failed seat occupation also failed"
                );
                return Err(ReserveError::Storage(storage_of(rollback_err)));
            }
            return Err(match occupy_err {
                InventoryError::SeatOutOfRange { seat, total } => {
                    ReserveError::SeatOutOfRange { seat, total }
                }
                _ => ReserveError::SeatUnavailable {
                    seat: req.seat_number,
                },
            });
        }

        tracing::info!(
            booking_id = %booking.id,
            bus_id = %bus.id,
            seat = req.seat_number,
            travel_date = %req.travel_date,
            fare_cents,
            "seat reserved"
        );
        let _ = self.events.send(ReservationEvent::SeatBooked(SeatBookedEvent {
            bus_id: bus.id,
            seat_number: req.seat_number,
            travel_date: req.travel_date,
            booking_id: booking.id,
            occurred_at: Utc::now().timestamp(),
        }));

        Ok(booking)
    }

    /// Cancels a booking on behalf of `requested_by`. Admins may cancel any
    /// booking; everyone else only their own. The ledger transition runs
    /// before the inventory release, so a crash in between leaves the ledger
    /// authoritative and the projection merely stale.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        requested_by: Uuid,
    ) -> Result<Booking, CancelError> {
        let booking = self.ledger.find(booking_id).await?;
        let requester = self
            .users
            .find(requested_by)
            .await?
            .ok_or(CancelError::UserNotFound(requested_by))?;
        if !requester.is_admin() && booking.user_id != requested_by {
            return Err(CancelError::NotOwner);
        }

        let cancelled = self.ledger.cancel(booking_id).await?;

        self.release_projection(&cancelled).await;

        let _ = self
            .events
            .send(ReservationEvent::SeatReleased(SeatReleasedEvent {
                bus_id: cancelled.bus_id,
                seat_number: cancelled.seat_number,
                travel_date: cancelled.travel_date,
                booking_id: cancelled.id,
                occurred_at: Utc::now().timestamp(),
            }));

        Ok(cancelled)
    }

    /// Best-effort seat release after a ledger cancellation. The ledger is
    /// the source of truth at this point; a stale projection is logged and
    /// re-derived rather than treated as a failure.
    async fn release_projection(&self, booking: &Booking) {
        if self
            .inventory
            .has_sheet(booking.bus_id, booking.travel_date)
        {
            match self
                .inventory
                .release(booking.bus_id, booking.seat_number, booking.travel_date)
            {
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        booking_id = %booking.id,
                        error = %err,
                        "seat projection stale on release, re-deriving from ledger"
                    );
                    if let Err(err) = self
                        .rebuild_inventory(booking.bus_id, booking.travel_date)
                        .await
                    {
                        tracing::warn!(error = %err, "could not re-derive seat projection");
                    }
                }
            }
        } else if let Err(err) = self
            .seed_projection(booking.bus_id, booking.travel_date)
            .await
        {
            // Sheet never materialized in this process; seed it from the
            // already-updated ledger instead of releasing a phantom seat.
            tracing::warn!(error = %err, "could not seed seat projection after cancel");
        }
    }

    async fn seed_projection(&self, bus_id: Uuid, date: NaiveDate) -> Result<(), ReserveError> {
        let bus = self.resolve_bus(bus_id).await?;
        self.ensure_sheet(&bus, date).await
    }

    /// Passenger contact fix-up with the same authorization and status gates
    /// as cancellation.
    pub async fn update_contact(
        &self,
        booking_id: Uuid,
        requested_by: Uuid,
        passenger_name: &str,
        passenger_phone: &Masked,
    ) -> Result<Booking, CancelError> {
        if passenger_name.trim().is_empty() {
            return Err(CancelError::InvalidInput("passenger name must not be empty"));
        }
        if passenger_phone.as_str().trim().is_empty() {
            return Err(CancelError::InvalidInput("passenger phone must not be empty"));
        }

        let booking = self.ledger.find(booking_id).await?;
        let requester = self
            .users
            .find(requested_by)
            .await?
            .ok_or(CancelError::UserNotFound(requested_by))?;
        if !requester.is_admin() && booking.user_id != requested_by {
            return Err(CancelError::NotOwner);
        }

        Ok(self
            .ledger
            .update_contact(booking_id, passenger_name.trim(), passenger_phone)
            .await?)
    }

    pub async fn is_available(
        &self,
        bus_id: Uuid,
        seat: u32,
        date: NaiveDate,
    ) -> Result<bool, ReserveError> {
        let bus = self.resolve_bus(bus_id).await?;
        self.ensure_sheet(&bus, date).await?;
        self.inventory
            .is_available(bus_id, seat, date)
            .map_err(map_inventory)
    }

    pub async fn available_count(&self, bus_id: Uuid, date: NaiveDate) -> Result<u32, ReserveError> {
        let bus = self.resolve_bus(bus_id).await?;
        self.ensure_sheet(&bus, date).await?;
        self.inventory
            .available_count(bus_id, date)
            .map_err(map_inventory)
    }

    /// Seat layout for rendering: (seat number, state) in seat-number order.
    pub async fn seat_map(
        &self,
        bus_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<(u32, SeatState)>, ReserveError> {
        let bus = self.resolve_bus(bus_id).await?;
        self.ensure_sheet(&bus, date).await?;
        self.inventory.snapshot(bus_id, date).map_err(map_inventory)
    }

    /// Admin recovery: force the projection back onto the ledger's confirmed
    /// set for one (bus, date) key.
    pub async fn rebuild_inventory(&self, bus_id: Uuid, date: NaiveDate) -> Result<(), ReserveError> {
        let bus = self.resolve_bus(bus_id).await?;
        self.inventory
            .register_bus(bus.id, bus.total_seats)
            .map_err(map_inventory)?;
        let confirmed = self
            .ledger
            .confirmed_seats(bus_id, date)
            .await
            .map_err(storage_of)?;
        self.inventory
            .rebuild(bus_id, date, &confirmed)
            .map_err(map_inventory)
    }

    /// Take a seat out of sale for one travel date (maintenance hold).
    pub async fn block_seat(&self, bus_id: Uuid, seat: u32, date: NaiveDate) -> Result<(), ReserveError> {
        let bus = self.resolve_bus(bus_id).await?;
        self.ensure_sheet(&bus, date).await?;
        self.inventory.block(bus_id, seat, date).map_err(map_inventory)
    }

    pub async fn unblock_seat(&self, bus_id: Uuid, seat: u32, date: NaiveDate) -> Result<(), ReserveError> {
        let bus = self.resolve_bus(bus_id).await?;
        self.ensure_sheet(&bus, date).await?;
        self.inventory
            .unblock(bus_id, seat, date)
            .map_err(map_inventory)
    }

    pub async fn bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        self.ledger.by_user(user_id).await.map_err(storage_of)
    }

    pub async fn bookings_for_bus(&self, bus_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        self.ledger.by_bus(bus_id).await.map_err(storage_of)
    }

    pub async fn booking(&self, id: Uuid) -> Result<Booking, CancelError> {
        Ok(self.ledger.find(id).await?)
    }
}
