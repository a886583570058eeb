use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Links a bus to a route on one weekday. A (bus, travel date) pair is
/// bookable only if some schedule for that bus runs on that date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub bus_id: Uuid,
    pub route_id: Uuid,
    pub departure: NaiveTime,
    pub arrival: NaiveTime,
    pub day_of_week: Weekday,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(
        bus_id: Uuid,
        route_id: Uuid,
        departure: NaiveTime,
        arrival: NaiveTime,
        day_of_week: Weekday,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            bus_id,
            route_id,
            departure,
            arrival,
            day_of_week,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn runs_on(&self, date: NaiveDate) -> bool {
        date.weekday() == self.day_of_week
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_on_matches_weekday() {
        let schedule = Schedule::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            Weekday::Sat,
        );

        // 2024-06-01 is a Saturday.
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        assert!(schedule.runs_on(saturday));
        assert!(!schedule.runs_on(sunday));
    }
}
