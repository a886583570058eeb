use motus_api::{app, state::AuthConfig, AppState};
use motus_fleet::fares::FareCalculator;
use motus_fleet::registry::{BusRegistry, RouteRegistry, ScheduleRegistry};
use motus_reserve::coordinator::ReservationCoordinator;
use motus_reserve::inventory::SeatInventory;
use motus_reserve::ledger::BookingLedger;
use motus_store::{DbClient, PostgresBookingStore, PostgresFleetStore, PostgresUserStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motus_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = motus_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Motus API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let fleet_store = Arc::new(PostgresFleetStore::new(db.pool.clone()));
    let booking_store = Arc::new(PostgresBookingStore::new(db.pool.clone()));
    let user_store = Arc::new(PostgresUserStore::new(db.pool.clone()));

    let (events, _) = tokio::sync::broadcast::channel(256);

    let coordinator = Arc::new(ReservationCoordinator::new(
        user_store,
        fleet_store.clone(),
        fleet_store.clone(),
        fleet_store.clone(),
        BookingLedger::new(booking_store.clone()),
        Arc::new(SeatInventory::new()),
        FareCalculator::new(config.fares.clone().into()),
        events.clone(),
    ));

    let buses = Arc::new(BusRegistry::new(fleet_store.clone(), booking_store));
    let routes = Arc::new(RouteRegistry::new(fleet_store.clone()));
    let schedules = Arc::new(ScheduleRegistry::new(
        fleet_store.clone(),
        fleet_store.clone(),
        fleet_store,
    ));

    let app_state = AppState {
        coordinator,
        buses,
        routes,
        schedules,
        events,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
