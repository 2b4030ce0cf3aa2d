//! Named profiling sections with per-pulse and cumulative statistics.
//!
//! Host code brackets regions of interest with enter/exit calls against a
//! section obtained from the [`ProfRegistry`]. Each section keeps two
//! parallel stat sets: per-pulse (reset at the top of every loop iteration
//! via [`ProfRegistry::reset_all_pulse`]) and cumulative (never reset).
//!
//! Enter/exit pairing is the caller's obligation. An exit with no pending
//! enter bumps the exit count but accumulates zero elapsed time.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

use crate::config::MonitorConfig;
use crate::report::ReportBuf;

/// Stable handle to a registered section.
///
/// Handles are cheap indices into the registry and remain valid for the
/// registry's lifetime; call sites typically obtain one lazily and cache it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionHandle(usize);

/// One named, independently timed region of host code.
#[derive(Debug)]
pub struct ProfSection {
    id: String,
    pulse_enters: u64,
    pulse_exits: u64,
    pulse_total: Duration,
    pulse_max: Duration,
    total_enters: u64,
    total: Duration,
    total_max: Duration,
    last_enter: Option<Instant>,
}

impl ProfSection {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            pulse_enters: 0,
            pulse_exits: 0,
            pulse_total: Duration::ZERO,
            pulse_max: Duration::ZERO,
            total_enters: 0,
            total: Duration::ZERO,
            total_max: Duration::ZERO,
            last_enter: None,
        }
    }

    /// Marks the beginning of the timed region.
    pub fn enter(&mut self) {
        self.pulse_enters = self.pulse_enters.saturating_add(1);
        self.total_enters = self.total_enters.saturating_add(1);
        self.last_enter = Some(Instant::now());
    }

    /// Marks the end of the timed region, accumulating the elapsed time into
    /// both stat sets. Ties on the max comparison keep the existing max.
    pub fn exit(&mut self) {
        let elapsed = self
            .last_enter
            .take()
            .map_or(Duration::ZERO, |enter| enter.elapsed());
        self.accumulate(elapsed);
    }

    fn accumulate(&mut self, elapsed: Duration) {
        self.pulse_exits = self.pulse_exits.saturating_add(1);
        self.pulse_total = self.pulse_total.saturating_add(elapsed);
        self.total = self.total.saturating_add(elapsed);
        if elapsed > self.pulse_max {
            self.pulse_max = elapsed;
        }
        if elapsed > self.total_max {
            self.total_max = elapsed;
        }
    }

    /// Zeroes the per-pulse stats; cumulative stats are untouched.
    pub fn reset_pulse(&mut self) {
        self.pulse_enters = 0;
        self.pulse_exits = 0;
        self.pulse_total = Duration::ZERO;
        self.pulse_max = Duration::ZERO;
    }

    /// Section name.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Enter count since the last per-pulse reset.
    #[must_use]
    pub const fn pulse_enters(&self) -> u64 {
        self.pulse_enters
    }

    /// Exit count since the last per-pulse reset.
    #[must_use]
    pub const fn pulse_exits(&self) -> u64 {
        self.pulse_exits
    }

    /// Elapsed time accumulated since the last per-pulse reset.
    #[must_use]
    pub const fn pulse_total(&self) -> Duration {
        self.pulse_total
    }

    /// Longest single entry since the last per-pulse reset.
    #[must_use]
    pub const fn pulse_max(&self) -> Duration {
        self.pulse_max
    }

    /// Enter count over the process lifetime.
    #[must_use]
    pub const fn total_enters(&self) -> u64 {
        self.total_enters
    }

    /// Elapsed time accumulated over the process lifetime.
    #[must_use]
    pub const fn total(&self) -> Duration {
        self.total
    }

    /// Longest single entry over the process lifetime.
    #[must_use]
    pub const fn total_max(&self) -> Duration {
        self.total_max
    }
}

const PULSE_HEADER: &str = "Pulse profiling info\n\n\
     Section name        |Enter Count |Exit Count  |usec total  |pulse %    |max pulse % (1 entry)\n\
     --------------------------------------------------------------------------------\n";

const TOTAL_HEADER: &str = "Cumulative profiling info\n\n\
     Section name        |Enter Count |usec total  |total %    |max pulse % (1 entry)\n\
     --------------------------------------------------------------------------------\n";

/// Owner of all profiling sections, keyed by name, created lazily.
#[derive(Debug)]
pub struct ProfRegistry {
    sections: Vec<ProfSection>,
    by_name: HashMap<String, usize>,
    budget_usec: u64,
    started_at: Instant,
}

impl ProfRegistry {
    /// Creates an empty registry; the configured loop rate fixes the pulse
    /// budget the percentage columns are computed against.
    #[must_use]
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            sections: Vec::new(),
            by_name: HashMap::new(),
            budget_usec: config.budget_usec(),
            started_at: Instant::now(),
        }
    }

    /// Returns the handle for `id`, creating the section on first use.
    ///
    /// An empty `id` yields `None` with no side effects.
    pub fn get_or_create(&mut self, id: &str) -> Option<SectionHandle> {
        if id.is_empty() {
            return None;
        }
        if let Some(&index) = self.by_name.get(id) {
            return Some(SectionHandle(index));
        }
        let index = self.sections.len();
        self.sections.push(ProfSection::new(id));
        self.by_name.insert(id.to_owned(), index);
        Some(SectionHandle(index))
    }

    /// Read access to a section.
    #[must_use]
    pub fn section(&self, handle: SectionHandle) -> &ProfSection {
        &self.sections[handle.0]
    }

    /// Marks entry into a section.
    pub fn enter(&mut self, handle: SectionHandle) {
        self.sections[handle.0].enter();
    }

    /// Marks exit from a section.
    pub fn exit(&mut self, handle: SectionHandle) {
        self.sections[handle.0].exit();
    }

    /// Resets per-pulse stats on every section. Intended to run once per
    /// loop iteration, before any enter call of that iteration.
    pub fn reset_all_pulse(&mut self) {
        for section in &mut self.sections {
            section.reset_pulse();
        }
    }

    /// Number of registered sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` while no section has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Renders the per-pulse table over all sections into `out`.
    ///
    /// Rows with a zero per-pulse enter count are omitted entirely. Returns
    /// the byte length written; truncates safely at capacity.
    pub fn render_pulse_report(&self, out: &mut [u8]) -> usize {
        let mut buf = ReportBuf::new(out);
        let _ = buf.write_str(PULSE_HEADER);
        for section in &self.sections {
            self.write_pulse_row(&mut buf, section);
        }
        buf.finish()
    }

    /// Renders the cumulative table over all sections into `out`.
    ///
    /// Rows with a zero cumulative enter count are omitted. Returns the byte
    /// length written; truncates safely at capacity.
    pub fn render_total_report(&self, out: &mut [u8]) -> usize {
        let mut buf = ReportBuf::new(out);
        let _ = buf.write_str(TOTAL_HEADER);
        for section in &self.sections {
            self.write_total_row(&mut buf, section);
        }
        buf.finish()
    }

    /// Renders both tables for one named section, back to back.
    ///
    /// An unknown `id` yields a short diagnostic message instead; that is
    /// not an error. Returns the byte length written.
    pub fn render_section_report(&self, id: &str, out: &mut [u8]) -> usize {
        let mut buf = ReportBuf::new(out);
        let Some(&index) = self.by_name.get(id) else {
            let _ = writeln!(buf, "No such section '{id}'");
            return buf.finish();
        };
        let section = &self.sections[index];
        let _ = buf.write_str(PULSE_HEADER);
        self.write_pulse_row(&mut buf, section);
        let _ = buf.write_str("\n");
        let _ = buf.write_str(TOTAL_HEADER);
        self.write_total_row(&mut buf, section);
        buf.finish()
    }

    #[allow(clippy::cast_precision_loss)]
    fn write_pulse_row(&self, buf: &mut ReportBuf<'_>, section: &ProfSection) {
        if section.pulse_enters == 0 {
            return;
        }
        let usec_total = section.pulse_total.as_micros();
        let percent = 100.0 * usec_total as f64 / self.budget_usec as f64;
        let max_percent = 100.0 * section.pulse_max.as_micros() as f64 / self.budget_usec as f64;
        let _ = writeln!(
            buf,
            "{:<20}|{:>12}|{:>12}|{:>12}|{:>10.2}%|{:>19.2}%",
            section.id, section.pulse_enters, section.pulse_exits, usec_total, percent, max_percent
        );
    }

    #[allow(clippy::cast_precision_loss)]
    fn write_total_row(&self, buf: &mut ReportBuf<'_>, section: &ProfSection) {
        if section.total_enters == 0 {
            return;
        }
        let usec_total = section.total.as_micros();
        let uptime_usec = self.started_at.elapsed().as_micros();
        let percent = if uptime_usec > 0 {
            100.0 * usec_total as f64 / uptime_usec as f64
        } else {
            0.0
        };
        let max_percent = 100.0 * section.total_max.as_micros() as f64 / self.budget_usec as f64;
        let _ = writeln!(
            buf,
            "{:<20}|{:>12}|{:>12}|{:>10.2}%|{:>19.2}%",
            section.id, section.total_enters, usec_total, percent, max_percent
        );
    }
}
