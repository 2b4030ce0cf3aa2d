//! Hierarchical interval ring buffers.
//!
//! Pulse samples land in a fixed-capacity ring of `(avg, min, max)` triples.
//! When a write wraps the ring past its last slot, the full buffer is
//! summarized into a single triple (average of averages, minimum of minimums,
//! maximum of maximums) and that rollup is forwarded to the next-coarser
//! buffer. Four buffers are chained: pulse -> second -> minute -> hour, so
//! one hour-level slot summarizes a full day's coarser rollups.
//!
//! The wrap is the *sole* aggregation trigger; reads never mutate state.

/// One aggregated observation: the average, minimum, and maximum load
/// percentage over some interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalSample {
    /// Mean load over the interval, as a percentage of the pulse budget.
    pub avg: f64,
    /// Minimum load over the interval.
    pub min: f64,
    /// Maximum load over the interval.
    pub max: f64,
}

impl IntervalSample {
    /// A raw single-pulse sample: the value is its own avg, min, and max.
    #[must_use]
    pub const fn raw(value: f64) -> Self {
        Self {
            avg: value,
            min: value,
            max: value,
        }
    }
}

/// Fixed-capacity circular buffer of [`IntervalSample`]s for one granularity.
#[derive(Debug, Clone)]
pub struct IntervalBuffer {
    slots: Vec<IntervalSample>,
    capacity: usize,
    write_index: usize,
}

impl IntervalBuffer {
    /// Creates an empty buffer.
    ///
    /// `capacity` must be positive; the chain constructors guarantee this.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "interval buffer capacity must be positive");
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            write_index: 0,
        }
    }

    /// Stores one sample, overwriting the oldest slot once full.
    ///
    /// Returns the rollup triple exactly when this write wrapped a full
    /// buffer; the caller forwards it to the next-coarser level. No other
    /// condition produces a rollup.
    pub fn record(&mut self, sample: IntervalSample) -> Option<IntervalSample> {
        if self.slots.len() < self.capacity {
            self.slots.push(sample);
        } else {
            self.slots[self.write_index] = sample;
        }
        self.write_index += 1;
        if self.write_index == self.capacity {
            self.write_index = 0;
            return Some(self.rollup());
        }
        None
    }

    /// Number of filled slots; grows to capacity and stays there.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` before the first sample is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot capacity of this buffer.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Arithmetic mean of the `avg` fields over filled slots; 0 when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_of_avgs(&self) -> f64 {
        if self.slots.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.slots.iter().map(|s| s.avg).sum();
        sum / self.slots.len() as f64
    }

    /// Minimum of the `min` fields over filled slots.
    ///
    /// Returns `f64::INFINITY` when empty. The sentinel is internal; report
    /// renderers substitute 0 at display time and must never print it.
    #[must_use]
    pub fn min_of_mins(&self) -> f64 {
        self.slots.iter().map(|s| s.min).fold(f64::INFINITY, f64::min)
    }

    /// Maximum of the `max` fields over filled slots; 0 when empty.
    #[must_use]
    pub fn max_of_maxes(&self) -> f64 {
        self.slots.iter().map(|s| s.max).fold(0.0, f64::max)
    }

    fn rollup(&self) -> IntervalSample {
        IntervalSample {
            avg: self.avg_of_avgs(),
            min: self.min_of_mins(),
            max: self.max_of_maxes(),
        }
    }
}

/// Granularity levels of the interval chain, finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalLevel {
    /// One slot per pulse; capacity = pulses per second.
    Pulse,
    /// One slot per second, 60 slots.
    Second,
    /// One slot per minute, 60 slots.
    Minute,
    /// One slot per hour, 24 slots.
    Hour,
}

impl IntervalLevel {
    /// All levels, finest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pulse, Self::Second, Self::Minute, Self::Hour]
    }

    /// Row label used by the pulse-history report.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pulse => "Pulses",
            Self::Second => "Seconds",
            Self::Minute => "Minutes",
            Self::Hour => "Hours",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Pulse => 0,
            Self::Second => 1,
            Self::Minute => 2,
            Self::Hour => 3,
        }
    }
}

const SECONDS_PER_MINUTE: usize = 60;
const MINUTES_PER_HOUR: usize = 60;
const HOURS_PER_DAY: usize = 24;

/// The four-level pulse -> second -> minute -> hour rollup chain.
#[derive(Debug, Clone)]
pub struct IntervalChain {
    levels: [IntervalBuffer; 4],
}

impl IntervalChain {
    /// Builds the chain for a loop running at `pulses_per_second`.
    #[must_use]
    pub fn new(pulses_per_second: u32) -> Self {
        debug_assert!(pulses_per_second > 0);
        Self {
            levels: [
                IntervalBuffer::new(pulses_per_second as usize),
                IntervalBuffer::new(SECONDS_PER_MINUTE),
                IntervalBuffer::new(MINUTES_PER_HOUR),
                IntervalBuffer::new(HOURS_PER_DAY),
            ],
        }
    }

    /// Records one raw pulse sample and cascades rollups upward.
    ///
    /// A wrap at one level feeds the next within the same call, so a single
    /// pulse can advance several levels at once. The hour-level rollup has no
    /// parent and is discarded.
    pub fn record(&mut self, value: f64) {
        let mut carry = Some(IntervalSample::raw(value));
        for buffer in &mut self.levels {
            let Some(sample) = carry else { break };
            carry = buffer.record(sample);
        }
    }

    /// Read access to one level's buffer.
    #[must_use]
    pub const fn level(&self, level: IntervalLevel) -> &IntervalBuffer {
        &self.levels[level.index()]
    }
}
