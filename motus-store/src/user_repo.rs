use async_trait::async_trait;
use motus_core::identity::{Role, User, UserStore};
use motus_core::StoreResult;
use motus_shared::pii::Masked;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::map_sqlx;

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: Masked::new(row.try_get::<String, _>("password_hash")?),
        full_name: row.try_get("full_name")?,
        phone_number: Masked::new(row.try_get::<String, _>("phone_number")?),
        role: Role::parse_lossy(&row.try_get::<String, _>("role")?),
        created_at: row.try_get("created_at")?,
        last_login: row.try_get("last_login")?,
    })
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, full_name, phone_number, role, created_at, last_login)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .bind(&user.full_name)
        .bind(user.phone_number.as_str())
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.last_login)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(user_from_row).transpose().map_err(map_sqlx)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.as_ref().map(user_from_row).transpose().map_err(map_sqlx)
    }
}
