pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod fleet_repo;
pub mod user_repo;

pub use booking_repo::PostgresBookingStore;
pub use database::DbClient;
pub use fleet_repo::PostgresFleetStore;
pub use user_repo::PostgresUserStore;

use motus_core::StoreError;

/// Map driver errors onto the shared store error surface. Unique-index
/// violations become conflicts so callers can treat a lost seat race or a
/// duplicate fleet number as domain outcomes, not backend failures.
pub(crate) fn map_sqlx(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    StoreError::backend(err)
}
