// SPDX-License-Identifier: MIT

//! Running records and the per-user statistics computed over them.

use chrono::NaiveDateTime;

use crate::pace;

/// One completed run.
#[derive(Debug, Clone)]
pub struct RunningRecord {
    pub id: i64,
    pub user_id: i64,
    pub distance_km: f64,
    pub duration_minutes: i64,
    /// Decimal minutes per kilometre, kept alongside the formatted string
    /// so aggregates stay numeric.
    pub pace_min_per_km: f64,
    /// Pace formatted as `M'SS"/km`
    pub pace: String,
    pub best_pace: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub route_data: Option<String>,
    pub weather: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Average pace of a run in decimal minutes per kilometre. Zero distance
/// or duration yields 0.0 rather than a division error.
pub fn pace_for(distance_km: f64, duration_minutes: i64) -> f64 {
    if distance_km <= 0.0 || duration_minutes <= 0 {
        return 0.0;
    }
    duration_minutes as f64 / distance_km
}

/// Aggregate running statistics for one user.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    pub total_runs: i64,
    pub total_distance_km: f64,
    pub total_duration_minutes: i64,
    /// Mean pace over all runs, decimal minutes per km (0.0 when no runs)
    pub average_pace_min_per_km: f64,
    /// Fastest recorded pace, decimal minutes per km (0.0 when no runs)
    pub best_pace_min_per_km: f64,
    pub last_run_date: Option<NaiveDateTime>,
}

impl RunningStats {
    pub fn average_distance_km(&self) -> f64 {
        if self.total_runs == 0 {
            0.0
        } else {
            self.total_distance_km / self.total_runs as f64
        }
    }

    pub fn average_duration_minutes(&self) -> i64 {
        if self.total_runs == 0 {
            0
        } else {
            self.total_duration_minutes / self.total_runs
        }
    }

    pub fn average_pace(&self) -> String {
        pace::format_min_per_km(self.average_pace_min_per_km)
    }

    pub fn best_pace(&self) -> String {
        pace::format_min_per_km(self.best_pace_min_per_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pace_for_basic() {
        // 30 minutes over 5 km = 6 min/km
        assert_eq!(pace_for(5.0, 30), 6.0);
        assert_eq!(pace_for(10.0, 55), 5.5);
    }

    #[test]
    fn test_pace_for_degenerate_inputs() {
        assert_eq!(pace_for(0.0, 30), 0.0);
        assert_eq!(pace_for(5.0, 0), 0.0);
    }

    #[test]
    fn test_stats_averages() {
        let stats = RunningStats {
            total_runs: 4,
            total_distance_km: 22.0,
            total_duration_minutes: 130,
            average_pace_min_per_km: 5.9,
            best_pace_min_per_km: 5.25,
            last_run_date: None,
        };

        assert_eq!(stats.average_distance_km(), 5.5);
        assert_eq!(stats.average_duration_minutes(), 32);
        assert_eq!(stats.average_pace(), "5'54\"/km");
        assert_eq!(stats.best_pace(), "5'15\"/km");
    }

    #[test]
    fn test_stats_with_no_runs() {
        let stats = RunningStats::default();

        assert_eq!(stats.average_distance_km(), 0.0);
        assert_eq!(stats.average_duration_minutes(), 0);
        assert_eq!(stats.average_pace(), "0'00\"/km");
    }
}
