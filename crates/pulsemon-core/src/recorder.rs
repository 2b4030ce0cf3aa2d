//! Pulse recorder: scalars, threshold counters, and the rollup chain.
//!
//! [`PulseRecorder`] is the full recording path behind the adaptive
//! controller. One call per recorded pulse updates the last/max-ever
//! scalars, the threshold table, and the interval chain; `render_report`
//! reads all of it back as fixed-layout text.

use std::fmt::Write as _;
use std::time::Instant;

use crate::config::MonitorConfig;
use crate::interval::{IntervalBuffer, IntervalChain, IntervalLevel};
use crate::report::ReportBuf;
use crate::threshold::ThresholdTable;

/// Recorder state for one host loop.
///
/// Constructed once at host startup; the start instant anchors the uptime
/// figures in the report. Single-writer: all calls must come from the loop
/// thread.
#[derive(Debug)]
pub struct PulseRecorder {
    last: f64,
    max_ever: f64,
    chain: IntervalChain,
    thresholds: ThresholdTable,
    started_at: Instant,
    pulses_per_second: u32,
}

impl PulseRecorder {
    /// Creates a recorder for a validated configuration.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            last: 0.0,
            max_ever: 0.0,
            chain: IntervalChain::new(config.pulses_per_second),
            thresholds: ThresholdTable::new(&config.thresholds),
            started_at: Instant::now(),
            pulses_per_second: config.pulses_per_second,
        }
    }

    /// Records one pulse's load as a percentage of the pulse budget.
    ///
    /// Values over 100 mean the loop overran its budget; they are expected
    /// and unbounded above.
    pub fn record_pulse(&mut self, value: f64) {
        self.last = value;
        if value > self.max_ever {
            self.max_ever = value;
        }
        self.thresholds.record(value);
        self.chain.record(value);
    }

    /// Most recently recorded value.
    #[must_use]
    pub const fn last(&self) -> f64 {
        self.last
    }

    /// Highest value ever recorded.
    #[must_use]
    pub const fn max_ever(&self) -> f64 {
        self.max_ever
    }

    /// The interval chain, for programmatic readout.
    #[must_use]
    pub const fn chain(&self) -> &IntervalChain {
        &self.chain
    }

    /// The threshold table, for programmatic readout.
    #[must_use]
    pub const fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// Seconds since the recorder was constructed.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Renders the pulse-history report into `out`, returning the byte
    /// length written.
    ///
    /// Layout: a pseudo 1-pulse row from the last sample, one row per
    /// interval level, the all-time maximum, then one line per threshold
    /// with its violation count and that count as a percentage of the
    /// *estimated* pulses since startup (`uptime x pulses_per_second`).
    /// The estimate is a documented approximation: under sampling or
    /// over-budget-only modes the recorder sees fewer calls than the loop
    /// ran, and the percentages undercount accordingly.
    ///
    /// Truncates safely at the buffer capacity; see [`ReportBuf`].
    #[allow(clippy::cast_precision_loss)]
    pub fn render_report(&self, out: &mut [u8]) -> usize {
        let mut buf = ReportBuf::new(out);

        let _ = writeln!(buf, "                     Avg          Min          Max");
        let _ = writeln!(
            buf,
            "  1 Pulse:   {:>10.2}%  {:>10.2}%  {:>10.2}%",
            self.last, self.last, self.last
        );
        for &level in IntervalLevel::all() {
            let data = self.chain.level(level);
            let _ = writeln!(
                buf,
                "{:>3} {:<8} {:>10.2}%  {:>10.2}%  {:>10.2}%",
                data.len(),
                format!("{}:", level.label()),
                data.avg_of_avgs(),
                display_min(data),
                data.max_of_maxes()
            );
        }
        let _ = writeln!(buf, "\nMax pulse:   {:>10.2}%\n", self.max_ever);

        let estimated_pulses = self.uptime_secs() as f64 * f64::from(self.pulses_per_second);
        for entry in self.thresholds.entries() {
            let percent = if estimated_pulses > 0.0 {
                100.0 * entry.violations() as f64 / estimated_pulses
            } else {
                0.0
            };
            let _ = writeln!(
                buf,
                "Over {:>5}%:  {:>6.2}% ({})",
                entry.threshold(),
                percent,
                entry.violations()
            );
        }

        buf.finish()
    }
}

/// Display-time substitution for the empty-buffer minimum sentinel: the
/// internal "no data" value is `+inf` and must never be shown.
fn display_min(data: &IntervalBuffer) -> f64 {
    if data.is_empty() {
        0.0
    } else {
        data.min_of_mins()
    }
}
