use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coach categories sold on the network. The set is closed: everything fare
/// calculation does is an exhaustive match, so a new category fails to
/// compile until its multiplier is decided.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusCategory {
    Ordinary,
    Deluxe,
    AirConditioned,
    Sleeper,
    Luxury,
}

impl BusCategory {
    /// Category fare multiplier. Ordinary sells below base, Sleeper and
    /// Luxury carry the premium band.
    pub fn fare_multiplier(&self) -> f64 {
        match self {
            BusCategory::Ordinary => 0.8,
            BusCategory::Deluxe | BusCategory::AirConditioned => 1.0,
            BusCategory::Sleeper | BusCategory::Luxury => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BusCategory::Ordinary => "ORDINARY",
            BusCategory::Deluxe => "DELUXE",
            BusCategory::AirConditioned => "AIR_CONDITIONED",
            BusCategory::Sleeper => "SLEEPER",
            BusCategory::Luxury => "LUXURY",
        }
    }

    /// Lossy parse for labels read back from storage. An unknown label is a
    /// data-quality issue: log it and fall back to the 1.0x band instead of
    /// trusting it or failing the whole row.
    pub fn parse_lossy(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "ORDINARY" => BusCategory::Ordinary,
            "DELUXE" => BusCategory::Deluxe,
            "AIR_CONDITIONED" | "AC" => BusCategory::AirConditioned,
            "SLEEPER" => BusCategory::Sleeper,
            "LUXURY" => BusCategory::Luxury,
            other => {
                tracing::warn!(
                    label = other,
                    "unknown bus category label, defaulting to DELUXE (1.0x)"
                );
                BusCategory::Deluxe
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusStatus {
    Active,
    Inactive,
    Maintenance,
}

impl BusStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusStatus::Active => "ACTIVE",
            BusStatus::Inactive => "INACTIVE",
            BusStatus::Maintenance => "MAINTENANCE",
        }
    }

    pub fn parse_lossy(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "ACTIVE" => BusStatus::Active,
            "INACTIVE" => BusStatus::Inactive,
            "MAINTENANCE" => BusStatus::Maintenance,
            other => {
                tracing::warn!(label = other, "unknown bus status label, defaulting to INACTIVE");
                BusStatus::Inactive
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub id: Uuid,
    /// Fleet number painted on the coach; unique across the fleet.
    pub number: String,
    pub name: String,
    pub category: BusCategory,
    /// Seat numbering is 1-based and contiguous up to this count. The count
    /// is fixed at creation; replacing the seat plan means retiring the bus.
    pub total_seats: u32,
    pub base_fare_cents: i64,
    pub status: BusStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bus {
    pub fn new(
        number: impl Into<String>,
        name: impl Into<String>,
        category: BusCategory,
        total_seats: u32,
        base_fare_cents: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            name: name.into(),
            category,
            total_seats,
            base_fare_cents,
            status: BusStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BusStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_multipliers_cover_the_bands() {
        assert_eq!(BusCategory::Ordinary.fare_multiplier(), 0.8);
        assert_eq!(BusCategory::Deluxe.fare_multiplier(), 1.0);
        assert_eq!(BusCategory::AirConditioned.fare_multiplier(), 1.0);
        assert_eq!(BusCategory::Sleeper.fare_multiplier(), 1.5);
        assert_eq!(BusCategory::Luxury.fare_multiplier(), 1.5);
    }

    #[test]
    fn unknown_category_label_falls_back_to_deluxe() {
        assert_eq!(BusCategory::parse_lossy("VOLVO"), BusCategory::Deluxe);
        assert_eq!(BusCategory::parse_lossy("ac"), BusCategory::AirConditioned);
    }
}
