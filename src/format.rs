//! Distance, clock time and duration formatting.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::locale::Phrases;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Clock {
    #[default]
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "12h")]
    H12,
}

const FEET_PER_METER: f64 = 3.280_84;
const METERS_PER_MILE: f64 = 1_609.344;

/// Turns raw planner numbers into display text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Formatter {
    pub units: Units,
    pub clock: Clock,
}

impl Formatter {
    pub fn new(units: Units, clock: Clock) -> Self {
        Formatter { units, clock }
    }

    pub fn distance(&self, meters: f64) -> String {
        match self.units {
            Units::Metric => {
                if meters >= 1000.0 {
                    format!("{:.1} km", meters / 1000.0)
                } else {
                    format!("{} m", ((meters / 10.0).round() * 10.0) as i64)
                }
            }
            Units::Imperial => {
                let miles = meters / METERS_PER_MILE;
                if miles >= 0.1 {
                    format!("{miles:.1} mi")
                } else {
                    let feet = meters * FEET_PER_METER;
                    format!("{} ft", ((feet / 10.0).round() * 10.0) as i64)
                }
            }
        }
    }

    /// Clock time of an epoch-millisecond instant in the agency's time zone.
    ///
    /// `offset_ms` is the agency's offset from UTC. Out-of-range input
    /// renders as `--:--`.
    pub fn time(&self, offset_ms: i64, millis: i64) -> String {
        let zone = i32::try_from(offset_ms / 1000)
            .ok()
            .and_then(FixedOffset::east_opt);
        let instant = DateTime::from_timestamp_millis(millis);

        match (zone, instant) {
            (Some(zone), Some(instant)) => {
                let local = instant.with_timezone(&zone);
                match self.clock {
                    Clock::H24 => local.format("%H:%M").to_string(),
                    Clock::H12 => local.format("%-I:%M %p").to_string(),
                }
            }
            _ => "--:--".to_string(),
        }
    }

    /// Actual time annotated with how far it is from the schedule.
    pub fn time_updated(&self, phrases: &Phrases, offset_ms: i64, scheduled: i64, actual: i64) -> String {
        let minutes = actual.saturating_sub(scheduled) / 60_000;
        let note = if minutes > 0 {
            phrases.late.replace("{minutes}", &minutes.to_string())
        } else if minutes < 0 {
            phrases.early.replace("{minutes}", &(-minutes).to_string())
        } else {
            phrases.on_time.clone()
        };
        format!("{} ({note})", self.time(offset_ms, actual))
    }

    pub fn duration(&self, phrases: &Phrases, seconds: f64) -> String {
        let total_minutes = (seconds.max(0.0) / 60.0).round() as i64;
        let hours = total_minutes / 60;
        let minutes = total_minutes % 60;
        if hours > 0 {
            format!("{hours} {} {minutes} {}", phrases.hours, phrases.minutes)
        } else {
            format!("{minutes} {}", phrases.minutes)
        }
    }
}

/// Seconds elapsed between two epoch-millisecond instants.
pub fn duration_between(start_ms: i64, end_ms: i64) -> f64 {
    end_ms.saturating_sub(start_ms) as f64 / 1000.0
}
