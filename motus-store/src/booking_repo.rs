use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use motus_core::StoreResult;
use motus_fleet::repository::ConfirmedBookingProbe;
use motus_reserve::models::{Booking, BookingStatus};
use motus_reserve::repository::BookingStore;
use motus_shared::pii::Masked;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::map_sqlx;

pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn booking_from_row(row: &PgRow) -> Result<Booking, sqlx::Error> {
    Ok(Booking {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        bus_id: row.try_get("bus_id")?,
        schedule_id: row.try_get("schedule_id")?,
        seat_number: row.try_get::<i32, _>("seat_number")? as u32,
        passenger_name: row.try_get("passenger_name")?,
        passenger_phone: Masked::new(row.try_get::<String, _>("passenger_phone")?),
        fare_cents: row.try_get("fare_cents")?,
        status: BookingStatus::parse_lossy(&row.try_get::<String, _>("status")?),
        booked_at: row.try_get("booked_at")?,
        travel_date: row.try_get("travel_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn insert(&self, booking: &Booking) -> StoreResult<()> {
        // The partial unique index on (bus_id, seat_number, travel_date)
        // WHERE status = 'CONFIRMED' turns a lost seat race into a Conflict.
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, bus_id, schedule_id, seat_number, passenger_name,
                                  passenger_phone, fare_cents, status, booked_at, travel_date,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.bus_id)
        .bind(booking.schedule_id)
        .bind(booking.seat_number as i32)
        .bind(&booking.passenger_name)
        .bind(booking.passenger_phone.as_str())
        .bind(booking.fare_cents)
        .bind(booking.status.as_str())
        .bind(booking.booked_at)
        .bind(booking.travel_date)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref()
            .map(booking_from_row)
            .transpose()
            .map_err(map_sqlx)
    }

    async fn find_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query("SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter()
            .map(booking_from_row)
            .collect::<Result<_, _>>()
            .map_err(map_sqlx)
    }

    async fn find_by_bus(&self, bus_id: Uuid) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query("SELECT * FROM bookings WHERE bus_id = $1 ORDER BY created_at DESC")
            .bind(bus_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter()
            .map(booking_from_row)
            .collect::<Result<_, _>>()
            .map_err(map_sqlx)
    }

    async fn mark_cancelled(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'CANCELLED', updated_at = $2 WHERE id = $1 AND status = 'CONFIRMED'",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_contact(
        &self,
        id: Uuid,
        passenger_name: &str,
        passenger_phone: &Masked,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings SET passenger_name = $2, passenger_phone = $3, updated_at = $4
            WHERE id = $1 AND status = 'CONFIRMED'
            "#,
        )
        .bind(id)
        .bind(passenger_name)
        .bind(passenger_phone.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }

    async fn confirmed_seats(
        &self,
        bus_id: Uuid,
        travel_date: NaiveDate,
    ) -> StoreResult<Vec<(u32, Uuid)>> {
        let rows = sqlx::query(
            r#"
            SELECT seat_number, id FROM bookings
            WHERE bus_id = $1 AND travel_date = $2 AND status = 'CONFIRMED'
            ORDER BY seat_number
            "#,
        )
        .bind(bus_id)
        .bind(travel_date)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.iter()
            .map(|row| {
                Ok((
                    row.try_get::<i32, _>("seat_number")? as u32,
                    row.try_get::<Uuid, _>("id")?,
                ))
            })
            .collect::<Result<_, sqlx::Error>>()
            .map_err(map_sqlx)
    }
}

#[async_trait]
impl ConfirmedBookingProbe for PostgresBookingStore {
    async fn has_confirmed_for_bus(&self, bus_id: Uuid) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE bus_id = $1 AND status = 'CONFIRMED') AS busy",
        )
        .bind(bus_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.try_get("busy").map_err(map_sqlx)
    }
}
