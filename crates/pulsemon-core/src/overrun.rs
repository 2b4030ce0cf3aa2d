//! Tiered, rate-limited logging of pulse-overrun high-water marks.
//!
//! Every pulse that sets a new elapsed-time high-water mark is classified by
//! how far over budget it ran. Each severity tier carries its own minimum
//! interval between log lines, so a pathological stretch of overruns cannot
//! flood the log; events that lose to the rate limit are counted and the
//! count is attached to the next emitted line.

use std::time::{Duration, Instant};

use tracing::warn;

/// Severity tiers for budget overruns, by load percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrunSeverity {
    /// Load above 200%: logged at most once per hour.
    Moderate,
    /// Load above 500%: logged at most once per ten minutes.
    Severe,
    /// Load above 1000%: logged at most once per minute.
    Critical,
}

impl OverrunSeverity {
    /// Classifies a load percentage; below 200% no tier applies.
    #[must_use]
    pub fn classify(pct: f64) -> Option<Self> {
        if pct > 1000.0 {
            Some(Self::Critical)
        } else if pct > 500.0 {
            Some(Self::Severe)
        } else if pct > 200.0 {
            Some(Self::Moderate)
        } else {
            None
        }
    }

    /// Minimum interval between log lines of this tier.
    #[must_use]
    pub const fn min_log_interval(&self) -> Duration {
        match self {
            Self::Moderate => Duration::from_secs(3600),
            Self::Severe => Duration::from_secs(600),
            Self::Critical => Duration::from_secs(60),
        }
    }

    /// Tier name as it appears in log lines.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Moderate => "MODERATE",
            Self::Severe => "SEVERE",
            Self::Critical => "CRITICAL",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Moderate => 0,
            Self::Severe => 1,
            Self::Critical => 2,
        }
    }
}

/// A high-water-mark event that cleared its tier's rate limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverrunRecord {
    /// Severity tier of the overrun.
    pub severity: OverrunSeverity,
    /// Load as a percentage of the pulse budget.
    pub pct: f64,
    /// Elapsed pulse time in microseconds; the new high-water mark.
    pub elapsed_usec: u64,
    /// Number of earlier high-water events suppressed since the last
    /// emitted record.
    pub suppressed: u64,
}

/// Tracks the elapsed-time high-water mark and decides which new marks
/// deserve a log line.
#[derive(Debug, Default)]
pub struct OverrunWatch {
    high_water_usec: u64,
    last_logged: [Option<Instant>; 3],
    suppressed: u64,
}

impl OverrunWatch {
    /// Creates a watch with no high-water mark.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current elapsed-time high-water mark, microseconds.
    #[must_use]
    pub const fn high_water_usec(&self) -> u64 {
        self.high_water_usec
    }

    /// Observes one pulse, emitting a `tracing::warn!` when a new high-water
    /// mark clears its tier's rate limit.
    pub fn observe(&mut self, pct: f64, elapsed_usec: u64) -> Option<OverrunRecord> {
        let record = self.observe_at(pct, elapsed_usec, Instant::now());
        if let Some(record) = record {
            warn!(
                severity = record.severity.as_str(),
                load_pct = record.pct,
                elapsed_usec = record.elapsed_usec,
                suppressed = record.suppressed,
                "pulse usage new high water mark"
            );
        }
        record
    }

    /// Core decision logic with an injected clock, for deterministic tests.
    ///
    /// Only a pulse that strictly exceeds the current high-water mark is an
    /// event at all. An event below the Moderate tier, or inside its tier's
    /// rate-limit window, is suppressed and counted; otherwise it is
    /// returned with the suppressed count, which then resets.
    pub fn observe_at(
        &mut self,
        pct: f64,
        elapsed_usec: u64,
        now: Instant,
    ) -> Option<OverrunRecord> {
        if elapsed_usec <= self.high_water_usec {
            return None;
        }
        self.high_water_usec = elapsed_usec;

        let loggable = OverrunSeverity::classify(pct).filter(|severity| {
            self.last_logged[severity.index()]
                .map_or(true, |last| now.duration_since(last) >= severity.min_log_interval())
        });

        match loggable {
            Some(severity) => {
                self.last_logged[severity.index()] = Some(now);
                let record = OverrunRecord {
                    severity,
                    pct,
                    elapsed_usec,
                    suppressed: self.suppressed,
                };
                self.suppressed = 0;
                Some(record)
            }
            None => {
                self.suppressed = self.suppressed.saturating_add(1);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_bounds() {
        assert_eq!(OverrunSeverity::classify(200.0), None);
        assert_eq!(OverrunSeverity::classify(200.1), Some(OverrunSeverity::Moderate));
        assert_eq!(OverrunSeverity::classify(500.0), Some(OverrunSeverity::Moderate));
        assert_eq!(OverrunSeverity::classify(500.1), Some(OverrunSeverity::Severe));
        assert_eq!(OverrunSeverity::classify(1000.0), Some(OverrunSeverity::Severe));
        assert_eq!(OverrunSeverity::classify(1500.0), Some(OverrunSeverity::Critical));
    }

    #[test]
    fn only_new_high_water_marks_are_events() {
        let mut watch = OverrunWatch::new();
        let now = Instant::now();
        assert!(watch.observe_at(2000.0, 100_000, now).is_some());
        // Same elapsed time is not a new mark, whatever the percentage.
        assert!(watch.observe_at(9000.0, 100_000, now).is_none());
        assert_eq!(watch.high_water_usec(), 100_000);
        // And the non-event did not count as suppressed.
        let record = watch
            .observe_at(2000.0, 200_000, now + Duration::from_secs(61))
            .unwrap();
        assert_eq!(record.suppressed, 0);
    }

    #[test]
    fn rate_limit_suppresses_within_window() {
        let mut watch = OverrunWatch::new();
        let start = Instant::now();
        let first = watch.observe_at(1500.0, 100_000, start).unwrap();
        assert_eq!(first.severity, OverrunSeverity::Critical);
        assert_eq!(first.suppressed, 0);

        // New marks inside the 60s critical window are suppressed.
        assert!(watch.observe_at(1600.0, 110_000, start + Duration::from_secs(10)).is_none());
        assert!(watch.observe_at(1700.0, 120_000, start + Duration::from_secs(30)).is_none());

        let later = watch
            .observe_at(1800.0, 130_000, start + Duration::from_secs(60))
            .unwrap();
        assert_eq!(later.suppressed, 2);
        // Counter reset after emission.
        let after = watch
            .observe_at(1900.0, 140_000, start + Duration::from_secs(121))
            .unwrap();
        assert_eq!(after.suppressed, 0);
    }

    #[test]
    fn tiers_rate_limit_independently() {
        let mut watch = OverrunWatch::new();
        let start = Instant::now();
        assert!(watch.observe_at(1500.0, 100_000, start).is_some());
        // A severe-tier mark right after a critical one is not blocked by
        // the critical window.
        let severe = watch.observe_at(600.0, 110_000, start + Duration::from_secs(1));
        assert_eq!(severe.unwrap().severity, OverrunSeverity::Severe);
    }

    #[test]
    fn below_moderate_is_counted_but_never_logged() {
        let mut watch = OverrunWatch::new();
        let start = Instant::now();
        assert!(watch.observe_at(150.0, 100_000, start).is_none());
        assert!(watch.observe_at(180.0, 110_000, start).is_none());
        assert_eq!(watch.high_water_usec(), 110_000);

        let record = watch
            .observe_at(700.0, 200_000, start + Duration::from_secs(1))
            .unwrap();
        assert_eq!(record.suppressed, 2);
    }

    #[test]
    fn observe_wrapper_matches_core_logic() {
        let mut watch = OverrunWatch::new();
        let record = watch.observe(1200.0, 120_000).unwrap();
        assert_eq!(record.severity, OverrunSeverity::Critical);
        assert_eq!(record.elapsed_usec, 120_000);
    }
}
