use serde::{Deserialize, Serialize};

use crate::bus::BusCategory;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareConfig {
    /// Route multipliers outside this band are treated as bad reference data
    /// and clamped.
    pub min_route_multiplier: f64,
    pub max_route_multiplier: f64,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            min_route_multiplier: 0.5,
            max_route_multiplier: 3.0,
        }
    }
}

/// Pure fare computation: base fare x category multiplier x route multiplier,
/// in integer cents, rounded half-up.
#[derive(Debug, Clone)]
pub struct FareCalculator {
    config: FareConfig,
}

impl FareCalculator {
    pub fn new(config: FareConfig) -> Self {
        Self { config }
    }

    pub fn quote(&self, base_fare_cents: i64, category: BusCategory, route_multiplier: f64) -> i64 {
        let clamped = route_multiplier
            .max(self.config.min_route_multiplier)
            .min(self.config.max_route_multiplier);
        if clamped != route_multiplier {
            tracing::warn!(
                route_multiplier,
                clamped,
                "route fare multiplier outside configured band, clamping"
            );
        }

        (base_fare_cents as f64 * category.fare_multiplier() * clamped).round() as i64
    }
}

impl Default for FareCalculator {
    fn default() -> Self {
        Self::new(FareConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_band_passes_base_fare_through() {
        let fares = FareCalculator::default();
        assert_eq!(fares.quote(1000, BusCategory::Deluxe, 1.0), 1000);
    }

    #[test]
    fn luxury_premium_and_route_multiplier_compound() {
        let fares = FareCalculator::default();
        // 20.00 x 1.5 x 1.2 = 36.00
        assert_eq!(fares.quote(2000, BusCategory::Luxury, 1.2), 3600);
    }

    #[test]
    fn ordinary_discount_rounds_to_the_cent() {
        let fares = FareCalculator::default();
        // 12.55 x 0.8 = 10.04
        assert_eq!(fares.quote(1255, BusCategory::Ordinary, 1.0), 1004);
    }

    #[test]
    fn absurd_route_multiplier_is_clamped() {
        let fares = FareCalculator::default();
        assert_eq!(fares.quote(1000, BusCategory::Deluxe, 40.0), 3000);
        assert_eq!(fares.quote(1000, BusCategory::Deluxe, 0.0), 500);
    }
}
