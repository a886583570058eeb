use async_trait::async_trait;
use chrono::{DateTime, Utc};
use motus_shared::pii::Masked;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Admin => "ADMIN",
        }
    }

    /// Lossy parse for labels coming back from storage. Unknown labels are a
    /// data-quality problem, not a crash: log and fall back to Customer.
    pub fn parse_lossy(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "CUSTOMER" => Role::Customer,
            "ADMIN" => Role::Admin,
            other => {
                tracing::warn!(label = other, "unknown role label, defaulting to CUSTOMER");
                Role::Customer
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Masked,
    pub full_name: String,
    pub phone_number: Masked,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<Masked>,
        full_name: impl Into<String>,
        phone_number: impl Into<Masked>,
        role: Role,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            full_name: full_name.into(),
            phone_number: phone_number.into(),
            role,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> StoreResult<()>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}

/// HashMap-backed store for tests and single-node deployments.
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        if users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(StoreError::conflict(format!(
                "username already taken: {}",
                user.username
            )));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        Ok(users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        Ok(users.values().find(|u| u.username == username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let store = MemoryUserStore::new();
        let first = User::new("asha", "asha@example.com", "h1", "Asha Rao", "555-0101", Role::Customer);
        let second = User::new("asha", "other@example.com", "h2", "Asha R.", "555-0102", Role::Customer);

        store.insert(&first).await.unwrap();
        let err = store.insert(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn lookup_by_username() {
        let store = MemoryUserStore::new();
        let user = User::new("kiran", "kiran@example.com", "h", "Kiran Dev", "555-0103", Role::Admin);
        store.insert(&user).await.unwrap();

        let found = store.find_by_username("kiran").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(found.is_admin());
    }
}
