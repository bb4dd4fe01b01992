use std::env;

use chrono::NaiveTime;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sweep_interval_secs: u64,
    pub day_starts_at: NaiveTime,
    pub day_ends_at: NaiveTime,
    pub slot_duration_minutes: u32,
    pub cancel_notice_hours: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("SWEEP_INTERVAL_SECS not set, defaulting to 3600");
                    3600
                }),
            day_starts_at: env::var("CLINIC_DAY_STARTS_AT")
                .ok()
                .and_then(|v| NaiveTime::parse_from_str(&v, "%H:%M").ok())
                .unwrap_or_else(|| {
                    warn!("CLINIC_DAY_STARTS_AT not set, defaulting to 09:00");
                    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
                }),
            day_ends_at: env::var("CLINIC_DAY_ENDS_AT")
                .ok()
                .and_then(|v| NaiveTime::parse_from_str(&v, "%H:%M").ok())
                .unwrap_or_else(|| {
                    warn!("CLINIC_DAY_ENDS_AT not set, defaulting to 18:00");
                    NaiveTime::from_hms_opt(18, 0, 0).unwrap()
                }),
            slot_duration_minutes: env::var("SLOT_DURATION_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("SLOT_DURATION_MINUTES not set, defaulting to 60");
                    60
                }),
            cancel_notice_hours: env::var("CANCEL_NOTICE_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| {
                    warn!("CANCEL_NOTICE_HOURS not set, defaulting to 24");
                    24
                }),
        };

        if !config.is_valid() {
            warn!("Scheduling configuration is inconsistent - check clinic day bounds");
        }

        config
    }

    pub fn is_valid(&self) -> bool {
        self.day_starts_at < self.day_ends_at
            && self.slot_duration_minutes > 0
            && self.sweep_interval_secs > 0
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 3600,
            day_starts_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            day_ends_at: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            slot_duration_minutes: 60,
            cancel_notice_hours: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.is_valid());
        assert_eq!(config.cancel_notice_hours, 24);
    }

    #[test]
    fn inverted_day_bounds_are_flagged() {
        let config = AppConfig {
            day_starts_at: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            day_ends_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            ..AppConfig::default()
        };
        assert!(!config.is_valid());
    }
}
