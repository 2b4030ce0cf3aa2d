//! pulsemon-core - performance telemetry for fixed-rate server loops.
//!
//! A "pulse" is one iteration of a host's fixed-rate main loop. This crate
//! records how much of the per-pulse time budget each iteration consumed,
//! rolls that signal up through coarser time windows, counts load-threshold
//! violations, times named code regions, and adaptively throttles its own
//! recording cost so it can run inside the hot loop it instruments.
//!
//! # Components
//!
//! - [`interval`]: chained ring buffers (pulse -> second -> minute -> hour)
//!   that summarize a full buffer into the next-coarser one on wraparound
//! - [`threshold`]: ascending threshold table with monotonic violation
//!   counters
//! - [`recorder`]: the full recording path plus the pulse-history report
//! - [`profile`]: named profiling sections with per-pulse and cumulative
//!   stats, owned by a lazily-populated registry
//! - [`sampling`]: the adaptive controller - verbosity levels, 1-in-N
//!   sampling, and hysteresis-gated escalation under load
//! - [`overrun`]: tiered, rate-limited logging of overrun high-water marks
//! - [`report`]: the bounded text-buffer contract shared by all reports
//! - [`config`]: startup configuration and validation
//!
//! # Concurrency contract
//!
//! The core is single-writer by design: all calls are expected to originate
//! from the host loop thread, there is no internal locking, and no call
//! blocks or suspends. Hosts with multiple writer threads must add their own
//! synchronization around each entry point; doing so must not change any
//! aggregation, threshold, or hysteresis semantics.
//!
//! # Example
//!
//! ```rust
//! use pulsemon_core::{MonitorConfig, MonitorLevel, ProfRegistry, PulseMonitor};
//!
//! let config = MonitorConfig::builder()
//!     .pulses_per_second(10)
//!     .level(MonitorLevel::Full)
//!     .build();
//! let mut monitor = PulseMonitor::new(&config)?;
//! let mut registry = ProfRegistry::new(&config);
//! let combat = registry.get_or_create("combat").expect("non-empty id");
//!
//! // One loop iteration:
//! registry.reset_all_pulse();
//! registry.enter(combat);
//! // ... work ...
//! registry.exit(combat);
//! monitor.record_pulse(83.5); // 83.5% of the pulse budget consumed
//!
//! let mut buf = [0u8; 4096];
//! let len = monitor.recorder().render_report(&mut buf);
//! assert!(len > 0);
//! # Ok::<(), pulsemon_core::ConfigError>(())
//! ```

pub mod config;
pub mod interval;
pub mod overrun;
pub mod profile;
pub mod recorder;
pub mod report;
pub mod sampling;
pub mod threshold;

pub use config::{ConfigError, MonitorConfig, MonitorConfigBuilder};
pub use interval::{IntervalBuffer, IntervalChain, IntervalLevel, IntervalSample};
pub use overrun::{OverrunRecord, OverrunSeverity, OverrunWatch};
pub use profile::{ProfRegistry, ProfSection, SectionHandle};
pub use recorder::PulseRecorder;
pub use report::ReportBuf;
pub use sampling::{
    InvalidLevelError, MonitorLevel, MonitorStatus, PulseMonitor, UnknownLevelName,
};
pub use threshold::{ThresholdEntry, ThresholdTable, DEFAULT_THRESHOLDS};
