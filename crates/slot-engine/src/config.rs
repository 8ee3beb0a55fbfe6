//! Engine configuration.
//!
//! Loaded from JSON or from `SLOT_ENGINE_*` environment variables; every field has a
//! default so a partial document or an empty environment still yields a usable config.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dst::DstPolicy;
use crate::error::{Result, SchedulingError};
use crate::slots::MAX_SLOT_MINUTES;
use crate::timezone::{resolve_timezone, TimezonePolicy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Zone used for providers with no zone on record.
    pub default_timezone: String,
    pub timezone_policy: TimezonePolicy,
    pub dst_policy: DstPolicy,
    /// Slot length used when the caller does not pass one.
    pub default_slot_minutes: u32,
    /// Longest slot or appointment the engine accepts.
    pub max_slot_minutes: u32,
    /// Extra days before today's midnight included in the "future and recent" block listing.
    pub recent_block_days: u32,
    /// How many days ahead `next_available_slot` searches.
    pub search_horizon_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timezone: "UTC".to_string(),
            timezone_policy: TimezonePolicy::Lenient,
            dst_policy: DstPolicy::Skip,
            default_slot_minutes: 30,
            max_slot_minutes: MAX_SLOT_MINUTES,
            recent_block_days: 0,
            search_horizon_days: 30,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| SchedulingError::Validation(format!("invalid engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read `SLOT_ENGINE_*` variables, keeping the default for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_timezone: env::var("SLOT_ENGINE_DEFAULT_TIMEZONE")
                .unwrap_or(defaults.default_timezone),
            timezone_policy: env_parse("SLOT_ENGINE_TIMEZONE_POLICY", defaults.timezone_policy, |v| {
                match v {
                    "lenient" => Some(TimezonePolicy::Lenient),
                    "strict" => Some(TimezonePolicy::Strict),
                    _ => None,
                }
            }),
            dst_policy: env_parse("SLOT_ENGINE_DST_POLICY", defaults.dst_policy, |v| match v {
                "skip" => Some(DstPolicy::Skip),
                "shift_forward" => Some(DstPolicy::ShiftForward),
                _ => None,
            }),
            default_slot_minutes: env_parse(
                "SLOT_ENGINE_DEFAULT_SLOT_MINUTES",
                defaults.default_slot_minutes,
                |v| v.parse().ok(),
            ),
            max_slot_minutes: env_parse(
                "SLOT_ENGINE_MAX_SLOT_MINUTES",
                defaults.max_slot_minutes,
                |v| v.parse().ok(),
            ),
            recent_block_days: env_parse(
                "SLOT_ENGINE_RECENT_BLOCK_DAYS",
                defaults.recent_block_days,
                |v| v.parse().ok(),
            ),
            search_horizon_days: env_parse(
                "SLOT_ENGINE_SEARCH_HORIZON_DAYS",
                defaults.search_horizon_days,
                |v| v.parse().ok(),
            ),
        }
    }

    /// Check internal consistency. The default zone must resolve even under the lenient
    /// policy, since it is the fallback target.
    pub fn validate(&self) -> Result<()> {
        resolve_timezone(&self.default_timezone, TimezonePolicy::Strict)?;
        if self.default_slot_minutes == 0 {
            return Err(SchedulingError::Validation(
                "default_slot_minutes must be positive".to_string(),
            ));
        }
        if self.max_slot_minutes > MAX_SLOT_MINUTES {
            return Err(SchedulingError::Validation(format!(
                "max_slot_minutes {} exceeds {}",
                self.max_slot_minutes, MAX_SLOT_MINUTES
            )));
        }
        if self.default_slot_minutes > self.max_slot_minutes {
            return Err(SchedulingError::Validation(format!(
                "default_slot_minutes {} exceeds max_slot_minutes {}",
                self.default_slot_minutes, self.max_slot_minutes
            )));
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str, default: T, parse: impl Fn(&str) -> Option<T>) -> T {
    match env::var(key) {
        Ok(raw) => parse(raw.trim()).unwrap_or_else(|| {
            warn!(key, value = raw.as_str(), "unparseable config value, using default");
            default
        }),
        Err(_) => default,
    }
}
