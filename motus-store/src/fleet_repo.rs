use async_trait::async_trait;
use chrono::Weekday;
use motus_core::StoreResult;
use motus_fleet::bus::{Bus, BusCategory, BusStatus};
use motus_fleet::repository::{BusStore, RouteStore, ScheduleStore};
use motus_fleet::route::Route;
use motus_fleet::schedule::Schedule;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::map_sqlx;

pub struct PostgresFleetStore {
    pool: PgPool,
}

impl PostgresFleetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn weekday_to_str(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

fn weekday_parse_lossy(label: &str) -> Weekday {
    match label.to_ascii_uppercase().as_str() {
        "MONDAY" => Weekday::Mon,
        "TUESDAY" => Weekday::Tue,
        "WEDNESDAY" => Weekday::Wed,
        "THURSDAY" => Weekday::Thu,
        "FRIDAY" => Weekday::Fri,
        "SATURDAY" => Weekday::Sat,
        "SUNDAY" => Weekday::Sun,
        other => {
            tracing::warn!(label = other, "unknown day-of-week label, defaulting to MONDAY");
            Weekday::Mon
        }
    }
}

fn bus_from_row(row: &PgRow) -> Result<Bus, sqlx::Error> {
    Ok(Bus {
        id: row.try_get("id")?,
        number: row.try_get("number")?,
        name: row.try_get("name")?,
        category: BusCategory::parse_lossy(&row.try_get::<String, _>("category")?),
        total_seats: row.try_get::<i32, _>("total_seats")? as u32,
        base_fare_cents: row.try_get("base_fare_cents")?,
        status: BusStatus::parse_lossy(&row.try_get::<String, _>("status")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn route_from_row(row: &PgRow) -> Result<Route, sqlx::Error> {
    Ok(Route {
        id: row.try_get("id")?,
        origin: row.try_get("origin")?,
        destination: row.try_get("destination")?,
        distance_km: row.try_get("distance_km")?,
        duration_minutes: row.try_get::<i32, _>("duration_minutes")? as u32,
        fare_multiplier: row.try_get("fare_multiplier")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn schedule_from_row(row: &PgRow) -> Result<Schedule, sqlx::Error> {
    Ok(Schedule {
        id: row.try_get("id")?,
        bus_id: row.try_get("bus_id")?,
        route_id: row.try_get("route_id")?,
        departure: row.try_get("departure")?,
        arrival: row.try_get("arrival")?,
        day_of_week: weekday_parse_lossy(&row.try_get::<String, _>("day_of_week")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl BusStore for PostgresFleetStore {
    async fn insert(&self, bus: &Bus) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO buses (id, number, name, category, total_seats, base_fare_cents, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(bus.id)
        .bind(&bus.number)
        .bind(&bus.name)
        .bind(bus.category.as_str())
        .bind(bus.total_seats as i32)
        .bind(bus.base_fare_cents)
        .bind(bus.status.as_str())
        .bind(bus.created_at)
        .bind(bus.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Bus>> {
        let row = sqlx::query("SELECT * FROM buses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(bus_from_row).transpose().map_err(map_sqlx)
    }

    async fn find_by_number(&self, number: &str) -> StoreResult<Option<Bus>> {
        let row = sqlx::query("SELECT * FROM buses WHERE number = $1")
            .bind(number)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(bus_from_row).transpose().map_err(map_sqlx)
    }

    async fn update(&self, bus: &Bus) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE buses
            SET number = $2, name = $3, category = $4, base_fare_cents = $5, status = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(bus.id)
        .bind(&bus.number)
        .bind(&bus.name)
        .bind(bus.category.as_str())
        .bind(bus.base_fare_cents)
        .bind(bus.status.as_str())
        .bind(bus.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM buses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> StoreResult<Vec<Bus>> {
        let rows = sqlx::query("SELECT * FROM buses ORDER BY number")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(bus_from_row).collect::<Result<_, _>>().map_err(map_sqlx)
    }

    async fn list_active(&self) -> StoreResult<Vec<Bus>> {
        let rows = sqlx::query("SELECT * FROM buses WHERE status = 'ACTIVE' ORDER BY number")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(bus_from_row).collect::<Result<_, _>>().map_err(map_sqlx)
    }
}

#[async_trait]
impl RouteStore for PostgresFleetStore {
    async fn insert(&self, route: &Route) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO routes (id, origin, destination, distance_km, duration_minutes, fare_multiplier, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(route.id)
        .bind(&route.origin)
        .bind(&route.destination)
        .bind(route.distance_km)
        .bind(route.duration_minutes as i32)
        .bind(route.fare_multiplier)
        .bind(route.created_at)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Route>> {
        let row = sqlx::query("SELECT * FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(route_from_row).transpose().map_err(map_sqlx)
    }

    async fn update(&self, route: &Route) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE routes
            SET distance_km = $2, duration_minutes = $3, fare_multiplier = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(route.id)
        .bind(route.distance_km)
        .bind(route.duration_minutes as i32)
        .bind(route.fare_multiplier)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> StoreResult<Vec<Route>> {
        let rows = sqlx::query("SELECT * FROM routes ORDER BY origin, destination")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(route_from_row).collect::<Result<_, _>>().map_err(map_sqlx)
    }
}

#[async_trait]
impl ScheduleStore for PostgresFleetStore {
    async fn insert(&self, schedule: &Schedule) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO schedules (id, bus_id, route_id, departure, arrival, day_of_week, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(schedule.id)
        .bind(schedule.bus_id)
        .bind(schedule.route_id)
        .bind(schedule.departure)
        .bind(schedule.arrival)
        .bind(weekday_to_str(schedule.day_of_week))
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Schedule>> {
        let row = sqlx::query("SELECT * FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(schedule_from_row).transpose().map_err(map_sqlx)
    }

    async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_bus(&self, bus_id: Uuid) -> StoreResult<Vec<Schedule>> {
        let rows = sqlx::query("SELECT * FROM schedules WHERE bus_id = $1 ORDER BY departure")
            .bind(bus_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter()
            .map(schedule_from_row)
            .collect::<Result<_, _>>()
            .map_err(map_sqlx)
    }
}
