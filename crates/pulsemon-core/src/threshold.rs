//! Load-threshold violation counters.
//!
//! A small ascending table of percentage thresholds, each with a monotonic
//! counter of how many recorded pulses exceeded it. The table is fixed at
//! construction and never resized.

/// Default threshold table, in percent of the pulse budget.
pub const DEFAULT_THRESHOLDS: &[f64] = &[
    10.0, 30.0, 50.0, 70.0, 90.0, 100.0, 250.0, 500.0, 1000.0, 2500.0,
];

/// One threshold and its violation counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdEntry {
    threshold: f64,
    violations: u64,
}

impl ThresholdEntry {
    /// The threshold, in percent of the pulse budget.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// How many recorded pulses exceeded this threshold.
    #[must_use]
    pub const fn violations(&self) -> u64 {
        self.violations
    }
}

/// Ascending-sorted threshold table with per-entry violation counters.
#[derive(Debug, Clone)]
pub struct ThresholdTable {
    entries: Vec<ThresholdEntry>,
}

impl ThresholdTable {
    /// Builds a table from an ascending threshold list.
    ///
    /// Ordering is validated by [`MonitorConfig::validate`] before the table
    /// is constructed; the scan below relies on it.
    ///
    /// [`MonitorConfig::validate`]: crate::config::MonitorConfig::validate
    #[must_use]
    pub fn new(thresholds: &[f64]) -> Self {
        debug_assert!(
            thresholds.windows(2).all(|w| w[0] < w[1]),
            "thresholds must be strictly ascending"
        );
        Self {
            entries: thresholds
                .iter()
                .map(|&threshold| ThresholdEntry {
                    threshold,
                    violations: 0,
                })
                .collect(),
        }
    }

    /// Counts `value` against every threshold it strictly exceeds.
    ///
    /// The scan stops at the first threshold not exceeded: the table is
    /// ascending, so no later threshold can be exceeded either. This
    /// short-circuit keeps the per-pulse cost proportional to the load, not
    /// the table size.
    pub fn record(&mut self, value: f64) {
        for entry in &mut self.entries {
            if value > entry.threshold {
                entry.violations = entry.violations.saturating_add(1);
            } else {
                break;
            }
        }
    }

    /// The table entries, ascending by threshold.
    #[must_use]
    pub fn entries(&self) -> &[ThresholdEntry] {
        &self.entries
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLDS)
    }
}
