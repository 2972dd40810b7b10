use std::time::Duration;

use crate::types::HistoryRetentionPeriod;

pub const HISTORY_ALARM: &str = "CLEANUP_HISTORY_ALARM";

// sweep cadence when the retention setting can't be read
pub const DEFAULT_ALARM_PERIOD_MINUTES: u64 = 60;

const MINUTE_MS: u64 = 60 * 1000;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;

/// How long history is kept and how often the sweep runs for one retention setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionConfig {
    pub display_name: &'static str,
    pub milliseconds: u64,
    pub alarm_period_minutes: u64,
}

impl RetentionConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.milliseconds)
    }

    pub fn alarm_period(&self) -> Duration {
        Duration::from_secs(self.alarm_period_minutes * 60)
    }
}

pub const RETENTION_PERIODS: [HistoryRetentionPeriod; 5] = [
    HistoryRetentionPeriod::FiveMinutes,
    HistoryRetentionPeriod::TwentyFourHours,
    HistoryRetentionPeriod::SevenDays,
    HistoryRetentionPeriod::ThirtyDays,
    HistoryRetentionPeriod::NinetyDays,
];

impl HistoryRetentionPeriod {
    pub fn config(self) -> RetentionConfig {
        match self {
            HistoryRetentionPeriod::FiveMinutes => RetentionConfig {
                display_name: "5 Minutes",
                milliseconds: 5 * MINUTE_MS,
                alarm_period_minutes: 1,
            },
            HistoryRetentionPeriod::TwentyFourHours => RetentionConfig {
                display_name: "24 Hours",
                milliseconds: DAY_MS,
                alarm_period_minutes: 60,
            },
            HistoryRetentionPeriod::SevenDays => RetentionConfig {
                display_name: "7 Days",
                milliseconds: 7 * DAY_MS,
                alarm_period_minutes: 60,
            },
            HistoryRetentionPeriod::ThirtyDays => RetentionConfig {
                display_name: "30 Days",
                milliseconds: 30 * DAY_MS,
                alarm_period_minutes: 60,
            },
            HistoryRetentionPeriod::NinetyDays => RetentionConfig {
                display_name: "90 Days",
                milliseconds: 90 * DAY_MS,
                alarm_period_minutes: 60,
            },
        }
    }
}
