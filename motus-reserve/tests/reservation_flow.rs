//! End-to-end reservation flows over the in-memory backends, including the
//! concurrent races the coordinator exists to win.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use motus_core::identity::{MemoryUserStore, Role, User, UserStore};
use motus_core::StoreResult;
use motus_fleet::bus::{Bus, BusCategory};
use motus_fleet::fares::FareCalculator;
use motus_fleet::memory::{MemoryBusStore, MemoryRouteStore, MemoryScheduleStore};
use motus_fleet::repository::{BusStore, RouteStore, ScheduleStore};
use motus_fleet::route::Route;
use motus_fleet::schedule::Schedule;
use motus_reserve::{
    Booking, BookingLedger, BookingStatus, BookingStore, MemoryBookingStore,
    ReservationCoordinator, ReserveError, ReserveRequest, SeatInventory,
};
use motus_shared::pii::Masked;
use std::sync::Arc;
use tokio::sync::{broadcast, Barrier};
use uuid::Uuid;

// 2024-06-01 is a Saturday; fixtures schedule Saturdays.
fn travel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

struct Fixture {
    users: Arc<MemoryUserStore>,
    buses: Arc<MemoryBusStore>,
    routes: Arc<MemoryRouteStore>,
    schedules: Arc<MemoryScheduleStore>,
    bookings: Arc<dyn BookingStore>,
    customer: User,
    bus: Bus,
    schedule: Schedule,
}

impl Fixture {
    async fn new(total_seats: u32, bookings: Arc<dyn BookingStore>) -> Self {
        let users = Arc::new(MemoryUserStore::new());
        let buses = Arc::new(MemoryBusStore::new());
        let routes = Arc::new(MemoryRouteStore::new());
        let schedules = Arc::new(MemoryScheduleStore::new());

        let customer = User::new(
            "meera",
            "meera@example.com",
            "hash",
            "Meera Joshi",
            "555-0142",
            Role::Customer,
        );
        users.insert(&customer).await.unwrap();

        let bus = Bus::new("MH-12-8801", "Deccan Queen", BusCategory::Deluxe, total_seats, 1000);
        buses.insert(&bus).await.unwrap();

        let route = Route::new("Pune", "Mumbai", 148.0, 210, 1.0);
        routes.insert(&route).await.unwrap();

        let schedule = Schedule::new(
            bus.id,
            route.id,
            NaiveTime::from_hms_opt(7, 15, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 45, 0).unwrap(),
            Weekday::Sat,
        );
        schedules.insert(&schedule).await.unwrap();

        Self {
            users,
            buses,
            routes,
            schedules,
            bookings,
            customer,
            bus,
            schedule,
        }
    }

    /// A coordinator over the fixture's stores with a fresh inventory, as a
    /// new process would build one.
    fn coordinator(&self) -> Arc<ReservationCoordinator> {
        let (events, _) = broadcast::channel(64);
        Arc::new(ReservationCoordinator::new(
            self.users.clone(),
            self.buses.clone(),
            self.routes.clone(),
            self.schedules.clone(),
            BookingLedger::new(self.bookings.clone()),
            Arc::new(SeatInventory::new()),
            FareCalculator::default(),
            events,
        ))
    }

    fn request(&self, seat: u32) -> ReserveRequest {
        ReserveRequest {
            user_id: self.customer.id,
            bus_id: self.bus.id,
            schedule_id: self.schedule.id,
            seat_number: seat,
            passenger_name: "Meera Joshi".to_string(),
            passenger_phone: Masked::new("555-0142"),
            travel_date: travel_date(),
        }
    }
}

async fn confirmed_count(fixture: &Fixture) -> usize {
    fixture
        .bookings
        .find_by_bus(fixture.bus.id)
        .await
        .unwrap()
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed && b.travel_date == travel_date())
        .count()
}

#[tokio::test]
async fn n_concurrent_reserves_produce_exactly_one_confirmed_booking() {
    let fixture = Fixture::new(40, Arc::new(MemoryBookingStore::new())).await;
    let coordinator = fixture.coordinator();

    let start = Arc::new(Barrier::new(16));
    let mut handles = Vec::new();
    for _ in 0..16 {
        let coordinator = coordinator.clone();
        let req = fixture.request(7);
        let start = start.clone();
        handles.push(tokio::spawn(async move {
            start.wait().await;
            coordinator.reserve(req).await
        }));
    }

    let mut winners = 0;
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(booking) => {
                winners += 1;
                assert_eq!(booking.seat_number, 7);
            }
            Err(ReserveError::SeatUnavailable { seat: 7 }) => losers += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(losers, 15);

    assert_eq!(confirmed_count(&fixture).await, 1);
    assert_eq!(
        coordinator
            .available_count(fixture.bus.id, travel_date())
            .await
            .unwrap(),
        39
    );
}

/// Booking store that parks every insert on a barrier, forcing two racing
/// reservations past the availability check before either occupies the
/// seat. This drives the coordinator's compensating rollback on a fixed
/// schedule instead of hoping for the interleaving.
struct GatedInsertStore {
    inner: MemoryBookingStore,
    gate: Barrier,
}

#[async_trait]
impl BookingStore for GatedInsertStore {
    async fn insert(&self, booking: &Booking) -> StoreResult<()> {
        self.gate.wait().await;
        self.inner.insert(booking).await
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        self.inner.find(id).await
    }

    async fn find_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        self.inner.find_by_user(user_id).await
    }

    async fn find_by_bus(&self, bus_id: Uuid) -> StoreResult<Vec<Booking>> {
        self.inner.find_by_bus(bus_id).await
    }

    async fn mark_cancelled(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        self.inner.mark_cancelled(id, at).await
    }

    async fn update_contact(
        &self,
        id: Uuid,
        passenger_name: &str,
        passenger_phone: &Masked,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        self.inner
            .update_contact(id, passenger_name, passenger_phone, at)
            .await
    }

    async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.remove(id).await
    }

    async fn confirmed_seats(
        &self,
        bus_id: Uuid,
        travel_date: NaiveDate,
    ) -> StoreResult<Vec<(u32, Uuid)>> {
        self.inner.confirmed_seats(bus_id, travel_date).await
    }
}

#[tokio::test]
async fn losing_reservation_rolls_its_ledger_record_back() {
    let store = Arc::new(GatedInsertStore {
        inner: MemoryBookingStore::new(),
        gate: Barrier::new(2),
    });
    let fixture = Fixture::new(10, store).await;
    let coordinator = fixture.coordinator();

    let a = {
        let coordinator = coordinator.clone();
        let req = fixture.request(4);
        tokio::spawn(async move { coordinator.reserve(req).await })
    };
    let b = {
        let coordinator = coordinator.clone();
        let req = fixture.request(4);
        tokio::spawn(async move { coordinator.reserve(req).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in &results {
        if let Err(err) = result {
            assert!(matches!(err, ReserveError::SeatUnavailable { seat: 4 }));
        }
    }

    // The loser's record was written and then compensated away: the ledger
    // holds exactly the winner.
    let all = fixture.bookings.find_by_bus(fixture.bus.id).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, BookingStatus::Confirmed);
    assert_eq!(
        coordinator
            .available_count(fixture.bus.id, travel_date())
            .await
            .unwrap(),
        9
    );
}

#[tokio::test]
async fn availability_always_matches_the_confirmed_set() {
    let fixture = Fixture::new(5, Arc::new(MemoryBookingStore::new())).await;
    let coordinator = fixture.coordinator();

    let b1 = coordinator.reserve(fixture.request(1)).await.unwrap();
    let b2 = coordinator.reserve(fixture.request(2)).await.unwrap();
    let _b3 = coordinator.reserve(fixture.request(3)).await.unwrap();

    coordinator.cancel(b1.id, fixture.customer.id).await.unwrap();
    let _b4 = coordinator.reserve(fixture.request(1)).await.unwrap();
    coordinator.cancel(b2.id, fixture.customer.id).await.unwrap();

    let confirmed = confirmed_count(&fixture).await;
    let available = coordinator
        .available_count(fixture.bus.id, travel_date())
        .await
        .unwrap();
    assert_eq!(confirmed, 3);
    assert_eq!(available as usize, 5 - confirmed);
}

#[tokio::test]
async fn a_fresh_process_sees_the_ledgers_occupancy() {
    let bookings: Arc<dyn BookingStore> = Arc::new(MemoryBookingStore::new());
    let fixture = Fixture::new(4, bookings).await;

    let first = fixture.coordinator();
    let booking = first.reserve(fixture.request(2)).await.unwrap();

    // Same durable stores, new inventory: the sheet is seeded from the
    // ledger on first touch, so the seat is still taken.
    let second = fixture.coordinator();
    assert!(!second
        .is_available(fixture.bus.id, 2, travel_date())
        .await
        .unwrap());
    assert_eq!(
        second
            .available_count(fixture.bus.id, travel_date())
            .await
            .unwrap(),
        3
    );

    let err = second.reserve(fixture.request(2)).await.unwrap_err();
    assert!(matches!(err, ReserveError::SeatUnavailable { seat: 2 }));

    // Cancelling through the fresh process frees the seat for rebooking.
    second.cancel(booking.id, fixture.customer.id).await.unwrap();
    assert!(second
        .is_available(fixture.bus.id, 2, travel_date())
        .await
        .unwrap());
}

#[tokio::test]
async fn cancel_in_a_process_that_never_materialized_the_sheet() {
    let bookings: Arc<dyn BookingStore> = Arc::new(MemoryBookingStore::new());
    let fixture = Fixture::new(4, bookings).await;

    let first = fixture.coordinator();
    let kept = first.reserve(fixture.request(1)).await.unwrap();
    let dropped = first.reserve(fixture.request(2)).await.unwrap();

    // A second process cancels before ever reading the sheet. Its projection
    // is seeded from the post-cancel ledger: seat 1 occupied, seat 2 free.
    let second = fixture.coordinator();
    second.cancel(dropped.id, fixture.customer.id).await.unwrap();

    assert!(!second
        .is_available(fixture.bus.id, kept.seat_number, travel_date())
        .await
        .unwrap());
    assert!(second
        .is_available(fixture.bus.id, 2, travel_date())
        .await
        .unwrap());
    assert_eq!(
        second
            .available_count(fixture.bus.id, travel_date())
            .await
            .unwrap(),
        3
    );
}

#[tokio::test]
async fn rebuild_recovers_a_stale_projection() {
    let fixture = Fixture::new(4, Arc::new(MemoryBookingStore::new())).await;
    let coordinator = fixture.coordinator();

    let booking = coordinator.reserve(fixture.request(3)).await.unwrap();

    // Simulate drift: the ledger record disappears behind the projection's
    // back (administrative surgery), then an operator rebuilds.
    fixture.bookings.remove(booking.id).await.unwrap();
    coordinator
        .rebuild_inventory(fixture.bus.id, travel_date())
        .await
        .unwrap();

    assert!(coordinator
        .is_available(fixture.bus.id, 3, travel_date())
        .await
        .unwrap());
    assert_eq!(
        coordinator
            .available_count(fixture.bus.id, travel_date())
            .await
            .unwrap(),
        4
    );
}
