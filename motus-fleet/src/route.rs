use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A point-to-point leg of the network. Reference data: immutable once
/// created except through an explicit registry update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub duration_minutes: u32,
    /// Applied on top of the bus base fare; long or premium corridors carry
    /// a multiplier above 1.0.
    pub fare_multiplier: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Route {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        distance_km: f64,
        duration_minutes: u32,
        fare_multiplier: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            origin: origin.into(),
            destination: destination.into(),
            distance_km,
            duration_minutes,
            fare_multiplier,
            created_at: now,
            updated_at: now,
        }
    }
}
