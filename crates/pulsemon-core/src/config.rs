//! Telemetry configuration.
//!
//! [`MonitorConfig`] gathers everything the host decides at startup: the loop
//! rate, the initial monitoring level, sampling and escalation tuning, and
//! the threshold table. Defaults match a 10 Hz loop with 1-in-10 sampling
//! and dynamic escalation at 150% with a 20-point hysteresis margin.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sampling::MonitorLevel;
use crate::threshold::DEFAULT_THRESHOLDS;

/// Configuration errors surfaced by [`MonitorConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The loop rate must be positive; it sizes the pulse ring and the pulse
    /// budget.
    #[error("pulses per second must be positive")]
    ZeroPulseRate,

    /// The hysteresis margin must be positive and below the high-water mark,
    /// otherwise the de-escalation bound is meaningless.
    #[error(
        "hysteresis margin {margin} must be positive and below the high water mark {high_water}"
    )]
    InvalidHysteresis {
        /// Configured escalation threshold, percent.
        high_water: f64,
        /// Configured hysteresis margin, percentage points.
        margin: f64,
    },

    /// The threshold table must be non-empty and strictly ascending; the
    /// violation scan short-circuits on that ordering.
    #[error("thresholds must be non-empty and strictly ascending")]
    InvalidThresholds,
}

/// Startup configuration for the telemetry core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Fixed loop rate; one pulse budget is `1 / pulses_per_second`.
    pub pulses_per_second: u32,
    /// Initial monitoring level.
    pub level: MonitorLevel,
    /// Record 1 of every N pulses when the level is `Sampled`. Non-positive
    /// values are clamped to 1 at monitor construction, with a logged
    /// diagnostic.
    pub sample_rate: u32,
    /// Whether load-based auto-escalation is active.
    pub dynamic: bool,
    /// Load percentage above which escalation engages.
    pub high_water_pct: f64,
    /// Hysteresis margin in percentage points; de-escalation requires the
    /// load to drop below `high_water_pct - hysteresis_pct`.
    pub hysteresis_pct: f64,
    /// Ascending threshold table for violation counting.
    pub thresholds: Vec<f64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            pulses_per_second: 10,
            level: MonitorLevel::Sampled,
            sample_rate: 10,
            dynamic: true,
            high_water_pct: 150.0,
            hysteresis_pct: 20.0,
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
        }
    }
}

impl MonitorConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::new()
    }

    /// Checks the invariants the core relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated [`ConfigError`]. Validation never panics
    /// and leaves the configuration unchanged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pulses_per_second == 0 {
            return Err(ConfigError::ZeroPulseRate);
        }
        if !(self.hysteresis_pct > 0.0 && self.hysteresis_pct < self.high_water_pct) {
            return Err(ConfigError::InvalidHysteresis {
                high_water: self.high_water_pct,
                margin: self.hysteresis_pct,
            });
        }
        if self.thresholds.is_empty() || self.thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::InvalidThresholds);
        }
        Ok(())
    }

    /// Pulse budget in microseconds.
    ///
    /// Degenerate loop rates (zero, or faster than one pulse per
    /// microsecond) clamp to a 1 us budget rather than panic or report a
    /// zero budget; [`MonitorConfig::validate`] is where they get rejected.
    #[must_use]
    pub const fn budget_usec(&self) -> u64 {
        let rate = self.pulses_per_second as u64;
        let rate = if rate == 0 { 1 } else { rate };
        let budget = 1_000_000 / rate;
        if budget == 0 {
            1
        } else {
            budget
        }
    }
}

/// Builder for [`MonitorConfig`].
#[derive(Debug, Clone)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// Creates a builder seeded with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: MonitorConfig::default(),
        }
    }

    /// Sets the fixed loop rate.
    #[must_use]
    pub const fn pulses_per_second(mut self, rate: u32) -> Self {
        self.config.pulses_per_second = rate;
        self
    }

    /// Sets the initial monitoring level.
    #[must_use]
    pub const fn level(mut self, level: MonitorLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Sets the 1-in-N sample rate.
    #[must_use]
    pub const fn sample_rate(mut self, rate: u32) -> Self {
        self.config.sample_rate = rate;
        self
    }

    /// Enables or disables dynamic escalation.
    #[must_use]
    pub const fn dynamic(mut self, enabled: bool) -> Self {
        self.config.dynamic = enabled;
        self
    }

    /// Sets the escalation high-water mark, percent.
    #[must_use]
    pub const fn high_water_pct(mut self, pct: f64) -> Self {
        self.config.high_water_pct = pct;
        self
    }

    /// Sets the hysteresis margin, percentage points.
    #[must_use]
    pub const fn hysteresis_pct(mut self, pct: f64) -> Self {
        self.config.hysteresis_pct = pct;
        self
    }

    /// Replaces the threshold table.
    #[must_use]
    pub fn thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Finishes the builder.
    #[must_use]
    pub fn build(self) -> MonitorConfig {
        self.config
    }
}

impl Default for MonitorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
