//! Adaptive sampling controller around the pulse recorder.
//!
//! Recording every pulse of a hot loop has a cost; [`PulseMonitor`] gates
//! the full recording path behind a configurable verbosity level and an
//! optional load-based escalation rule. Escalation uses two distinct
//! thresholds (enter above the high-water mark, leave below the mark minus a
//! margin) so the monitor does not oscillate around a single boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, MonitorConfig};
use crate::recorder::PulseRecorder;

/// Cap on the rolling-average denominator, so the average stays responsive
/// to recent load instead of flattening over the whole uptime.
const LOAD_AVG_WINDOW: u32 = 100;

/// Load percentage above which `OverBudgetOnly` forwards a sample.
const OVER_BUDGET_PCT: f64 = 100.0;

/// Monitoring verbosity levels, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorLevel {
    /// Record nothing; `record_pulse` is a pure no-op.
    Off,
    /// Record only pulses that overran their budget (> 100%).
    OverBudgetOnly,
    /// Record 1 of every N pulses.
    Sampled,
    /// Record every pulse.
    Full,
}

impl MonitorLevel {
    /// All levels, in ascending verbosity.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Off, Self::OverBudgetOnly, Self::Sampled, Self::Full]
    }

    /// Name used in log lines and the host's command surface.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::OverBudgetOnly => "overbudget",
            Self::Sampled => "sampled",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for MonitorLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error for an out-of-range numeric level from the host's command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid monitoring level {0}; expected 0..=3")]
pub struct InvalidLevelError(pub u32);

impl TryFrom<u32> for MonitorLevel {
    type Error = InvalidLevelError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Off),
            1 => Ok(Self::OverBudgetOnly),
            2 => Ok(Self::Sampled),
            3 => Ok(Self::Full),
            other => Err(InvalidLevelError(other)),
        }
    }
}

impl std::str::FromStr for MonitorLevel {
    type Err = UnknownLevelName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "overbudget" | "basic" => Ok(Self::OverBudgetOnly),
            "sampled" | "sampling" => Ok(Self::Sampled),
            "full" => Ok(Self::Full),
            _ => Err(UnknownLevelName(s.to_owned())),
        }
    }
}

/// Error for an unrecognized level name from the host's command surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown monitoring level name '{0}'")]
pub struct UnknownLevelName(pub String);

/// Point-in-time snapshot of the controller state, for status display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    /// Configured verbosity level.
    pub level: MonitorLevel,
    /// 1-in-N sample rate used by the `Sampled` level.
    pub sample_rate: u32,
    /// Whether load-based escalation is active.
    pub dynamic: bool,
    /// Whether escalation currently forces full recording.
    pub high_load: bool,
    /// Rolling average of recent load values, percent.
    pub load_avg: f64,
}

/// The adaptive sampling controller; the host's single telemetry entry
/// point for pulse recording.
#[derive(Debug)]
pub struct PulseMonitor {
    recorder: PulseRecorder,
    level: MonitorLevel,
    sample_rate: u32,
    sample_counter: u32,
    dynamic: bool,
    high_load: bool,
    high_water: f64,
    hysteresis: f64,
    load_avg: f64,
    load_samples: u32,
}

impl PulseMonitor {
    /// Builds a monitor and its recorder from a configuration.
    ///
    /// A non-positive sample rate is clamped to 1 with a logged diagnostic
    /// rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration fails validation.
    pub fn new(config: &MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sample_rate = if config.sample_rate == 0 {
            warn!("sample rate 0 clamped to 1");
            1
        } else {
            config.sample_rate
        };
        Ok(Self {
            recorder: PulseRecorder::new(config),
            level: config.level,
            sample_rate,
            sample_counter: 0,
            dynamic: config.dynamic,
            high_load: false,
            high_water: config.high_water_pct,
            hysteresis: config.hysteresis_pct,
            load_avg: 0.0,
            load_samples: 0,
        })
    }

    /// Feeds one pulse's load value through the sampling gate.
    ///
    /// `Off` returns immediately with no state mutated, not even the rolling
    /// average. While escalated, every value is forwarded to the recorder
    /// regardless of the configured level.
    pub fn record_pulse(&mut self, value: f64) {
        if self.level == MonitorLevel::Off {
            return;
        }

        self.update_load_avg(value);

        if self.dynamic {
            self.update_high_load(value);
            if self.high_load {
                self.recorder.record_pulse(value);
                return;
            }
        }

        match self.level {
            MonitorLevel::Off => {}
            MonitorLevel::OverBudgetOnly => {
                if value > OVER_BUDGET_PCT {
                    self.recorder.record_pulse(value);
                }
            }
            MonitorLevel::Sampled => {
                self.sample_counter += 1;
                if self.sample_counter >= self.sample_rate {
                    self.recorder.record_pulse(value);
                    self.sample_counter = 0;
                }
            }
            MonitorLevel::Full => self.recorder.record_pulse(value),
        }
    }

    fn update_load_avg(&mut self, value: f64) {
        self.load_avg = (self.load_avg * f64::from(self.load_samples) + value)
            / f64::from(self.load_samples + 1);
        if self.load_samples < LOAD_AVG_WINDOW {
            self.load_samples += 1;
        }
    }

    /// Hysteresis state machine: escalate above the high-water mark,
    /// de-escalate only below `high_water - hysteresis`. Values between the
    /// two bounds leave the state unchanged.
    fn update_high_load(&mut self, value: f64) {
        if !self.high_load && value > self.high_water {
            self.high_load = true;
            info!(load = value, "high load detected, forcing full monitoring");
        } else if self.high_load && value < self.high_water - self.hysteresis {
            self.high_load = false;
            info!(
                load = value,
                level = %self.level,
                "load normalized, resuming configured level"
            );
        }
    }

    /// Sets the verbosity level and resets the sampling phase so the new
    /// level does not inherit a stale counter.
    pub fn set_level(&mut self, level: MonitorLevel) {
        self.level = level;
        self.sample_counter = 0;
        info!(level = %level, "monitoring level set");
    }

    /// Sets the level from the host's raw numeric input.
    ///
    /// # Errors
    ///
    /// Out-of-range input is rejected with [`InvalidLevelError`]; the
    /// rejection is logged and no state changes.
    pub fn try_set_level(&mut self, raw: u32) -> Result<(), InvalidLevelError> {
        match MonitorLevel::try_from(raw) {
            Ok(level) => {
                self.set_level(level);
                Ok(())
            }
            Err(err) => {
                warn!(requested = raw, "invalid monitoring level requested");
                Err(err)
            }
        }
    }

    /// Sets the 1-in-N sample rate, clamping non-positive input to 1 with a
    /// logged diagnostic.
    pub fn set_sample_rate(&mut self, rate: u32) {
        if rate == 0 {
            warn!("sample rate 0 clamped to 1");
            self.sample_rate = 1;
        } else {
            self.sample_rate = rate;
        }
    }

    /// Enables or disables dynamic escalation.
    pub fn set_dynamic(&mut self, enabled: bool) {
        self.dynamic = enabled;
    }

    /// Current verbosity level.
    #[must_use]
    pub const fn level(&self) -> MonitorLevel {
        self.level
    }

    /// Whether escalation currently forces full recording.
    #[must_use]
    pub const fn high_load(&self) -> bool {
        self.high_load
    }

    /// Rolling average of recent load values.
    #[must_use]
    pub const fn load_avg(&self) -> f64 {
        self.load_avg
    }

    /// Read access to the wrapped recorder, for reports and readout.
    #[must_use]
    pub const fn recorder(&self) -> &PulseRecorder {
        &self.recorder
    }

    /// Snapshot of the controller state for status display.
    #[must_use]
    pub const fn status(&self) -> MonitorStatus {
        MonitorStatus {
            level: self.level,
            sample_rate: self.sample_rate,
            dynamic: self.dynamic,
            high_load: self.high_load,
            load_avg: self.load_avg,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::interval::IntervalLevel;

    fn monitor(config: &MonitorConfig) -> PulseMonitor {
        PulseMonitor::new(config).expect("valid test config")
    }

    fn recorded(monitor: &PulseMonitor) -> usize {
        monitor.recorder().chain().level(IntervalLevel::Pulse).len()
            + 60 * monitor.recorder().chain().level(IntervalLevel::Second).len()
    }

    fn no_dynamic(level: MonitorLevel) -> MonitorConfig {
        MonitorConfig::builder()
            .pulses_per_second(1000)
            .level(level)
            .dynamic(false)
            .build()
    }

    #[test]
    fn off_is_a_pure_no_op() {
        let mut mon = monitor(&no_dynamic(MonitorLevel::Off));
        mon.record_pulse(500.0);
        mon.record_pulse(5000.0);
        assert_eq!(recorded(&mon), 0);
        assert_eq!(mon.load_avg(), 0.0);
        assert!(!mon.high_load());
    }

    #[test]
    fn over_budget_only_filters_at_100() {
        let mut mon = monitor(&no_dynamic(MonitorLevel::OverBudgetOnly));
        mon.record_pulse(99.0);
        mon.record_pulse(100.0);
        assert_eq!(recorded(&mon), 0);
        mon.record_pulse(100.1);
        assert_eq!(recorded(&mon), 1);
    }

    #[test]
    fn sampled_records_every_nth() {
        let config = MonitorConfig::builder()
            .pulses_per_second(1000)
            .level(MonitorLevel::Sampled)
            .sample_rate(10)
            .dynamic(false)
            .build();
        let mut mon = monitor(&config);
        for _ in 0..95 {
            mon.record_pulse(50.0);
        }
        assert_eq!(recorded(&mon), 9);
    }

    #[test]
    fn full_records_everything() {
        let mut mon = monitor(&no_dynamic(MonitorLevel::Full));
        for _ in 0..7 {
            mon.record_pulse(50.0);
        }
        assert_eq!(recorded(&mon), 7);
    }

    #[test]
    fn hysteresis_escalates_and_holds() {
        // high water 150, margin 20: de-escalation bound is 130.
        let config = MonitorConfig::builder()
            .pulses_per_second(1000)
            .level(MonitorLevel::Off)
            .build();
        // Off short-circuits before the dynamic check, so use Sampled with a
        // huge rate: nothing records unless escalation forces it.
        let config = MonitorConfig {
            level: MonitorLevel::Sampled,
            sample_rate: 1_000_000,
            ..config
        };
        let mut mon = monitor(&config);

        mon.record_pulse(160.0);
        assert!(mon.high_load());
        assert_eq!(recorded(&mon), 1);

        // 140 is inside the hysteresis band: stays escalated, still records.
        mon.record_pulse(140.0);
        assert!(mon.high_load());
        assert_eq!(recorded(&mon), 2);

        // Exactly the lower bound does not de-escalate (strictly below).
        mon.record_pulse(130.0);
        assert!(mon.high_load());

        // The de-escalating sample itself is no longer forced through: the
        // escalation check runs before dispatch, so 120 falls through to the
        // huge sample rate and records nothing.
        mon.record_pulse(120.0);
        assert!(!mon.high_load());
        assert_eq!(recorded(&mon), 3);
    }

    #[test]
    fn boundary_value_at_high_water_does_not_escalate() {
        let mut mon = monitor(
            &MonitorConfig::builder()
                .pulses_per_second(1000)
                .level(MonitorLevel::Full)
                .build(),
        );
        mon.record_pulse(150.0);
        assert!(!mon.high_load());
        mon.record_pulse(150.1);
        assert!(mon.high_load());
    }

    #[test]
    fn disabled_dynamic_never_escalates() {
        let mut mon = monitor(&no_dynamic(MonitorLevel::Full));
        mon.record_pulse(10_000.0);
        assert!(!mon.high_load());
    }

    #[test]
    fn set_level_resets_sampling_phase() {
        let config = MonitorConfig::builder()
            .pulses_per_second(1000)
            .level(MonitorLevel::Sampled)
            .sample_rate(10)
            .dynamic(false)
            .build();
        let mut mon = monitor(&config);
        for _ in 0..9 {
            mon.record_pulse(50.0);
        }
        assert_eq!(recorded(&mon), 0);
        // Level change discards the 9 pending counts.
        mon.set_level(MonitorLevel::Sampled);
        for _ in 0..9 {
            mon.record_pulse(50.0);
        }
        assert_eq!(recorded(&mon), 0);
        mon.record_pulse(50.0);
        assert_eq!(recorded(&mon), 1);
    }

    #[test]
    fn try_set_level_rejects_out_of_range() {
        let mut mon = monitor(&no_dynamic(MonitorLevel::Sampled));
        assert_eq!(mon.try_set_level(4), Err(InvalidLevelError(4)));
        assert_eq!(mon.level(), MonitorLevel::Sampled);
        assert_eq!(mon.try_set_level(3), Ok(()));
        assert_eq!(mon.level(), MonitorLevel::Full);
    }

    #[test]
    fn sample_rate_zero_clamps_to_one() {
        let mut mon = monitor(&no_dynamic(MonitorLevel::Sampled));
        mon.set_sample_rate(0);
        mon.record_pulse(50.0);
        assert_eq!(recorded(&mon), 1);
    }

    #[test]
    fn load_average_tracks_recent_values() {
        let mut mon = monitor(&no_dynamic(MonitorLevel::Full));
        mon.record_pulse(100.0);
        assert_eq!(mon.load_avg(), 100.0);
        mon.record_pulse(50.0);
        assert_eq!(mon.load_avg(), 75.0);
    }

    #[test]
    fn load_average_denominator_is_capped() {
        let mut mon = monitor(&no_dynamic(MonitorLevel::Full));
        for _ in 0..500 {
            mon.record_pulse(0.0);
        }
        // With a capped window the average must move noticeably on one
        // outlier: (0 * 100 + 101) / 101 ~= 1.0.
        mon.record_pulse(101.0);
        assert!(mon.load_avg() >= 0.99);
    }

    #[test]
    fn level_parsing() {
        assert_eq!("off".parse::<MonitorLevel>(), Ok(MonitorLevel::Off));
        assert_eq!("basic".parse::<MonitorLevel>(), Ok(MonitorLevel::OverBudgetOnly));
        assert_eq!("sampling".parse::<MonitorLevel>(), Ok(MonitorLevel::Sampled));
        assert_eq!("full".parse::<MonitorLevel>(), Ok(MonitorLevel::Full));
        assert!("loud".parse::<MonitorLevel>().is_err());
        assert_eq!(MonitorLevel::try_from(2), Ok(MonitorLevel::Sampled));
    }

    #[test]
    fn status_snapshot_reflects_state() {
        let mut mon = monitor(&no_dynamic(MonitorLevel::Sampled));
        mon.record_pulse(80.0);
        let status = mon.status();
        assert_eq!(status.level, MonitorLevel::Sampled);
        assert_eq!(status.sample_rate, 10);
        assert!(!status.dynamic);
        assert!(!status.high_load);
        assert_eq!(status.load_avg, 80.0);

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"sampled\""));
    }

    proptest! {
        #[test]
        fn hysteresis_never_deescalates_inside_band(
            values in prop::collection::vec(130.0f64..=150.0, 1..50)
        ) {
            let mut mon = monitor(
                &MonitorConfig::builder()
                    .pulses_per_second(1000)
                    .level(MonitorLevel::Full)
                    .build(),
            );
            mon.record_pulse(200.0);
            prop_assert!(mon.high_load());
            for &v in &values {
                mon.record_pulse(v);
                prop_assert!(mon.high_load());
            }
        }
    }
}
