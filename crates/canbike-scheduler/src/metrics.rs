//! Frame lateness tracking.

/// Lateness statistics for the render loop.
///
/// Samples are kept in a bounded ring buffer; percentile queries reuse a
/// scratch vector so steady-state recording does not allocate.
#[derive(Debug, Clone)]
pub struct FrameMetrics {
    /// Frames recorded
    pub total_frames: u64,

    /// Frames that started a whole period or more after their deadline
    pub missed_frames: u64,

    /// Worst observed lateness in nanoseconds
    pub max_lateness_ns: u64,

    /// Lateness of the most recent frame
    pub last_lateness_ns: u64,

    samples: Vec<u64>,
    capacity: usize,
    next_index: usize,
    scratch: Vec<u64>,
}

impl Default for FrameMetrics {
    fn default() -> Self {
        // Ten seconds at 60 Hz.
        Self::with_capacity(600)
    }
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            total_frames: 0,
            missed_frames: 0,
            max_lateness_ns: 0,
            last_lateness_ns: 0,
            samples: Vec::with_capacity(capacity),
            capacity,
            next_index: 0,
            scratch: Vec::with_capacity(capacity),
        }
    }

    /// Record one frame start.
    pub fn record_frame(&mut self, lateness_ns: u64, missed: bool) {
        self.total_frames = self.total_frames.saturating_add(1);
        if missed {
            self.missed_frames = self.missed_frames.saturating_add(1);
        }
        self.max_lateness_ns = self.max_lateness_ns.max(lateness_ns);
        self.last_lateness_ns = lateness_ns;

        if self.capacity == 0 {
            return;
        }
        if self.samples.len() < self.capacity {
            self.samples.push(lateness_ns);
        } else if let Some(slot) = self.samples.get_mut(self.next_index) {
            *slot = lateness_ns;
            self.next_index = (self.next_index + 1) % self.capacity;
        }
    }

    /// p99 lateness over the retained window, 0 when empty.
    pub fn p99_lateness_ns(&mut self) -> u64 {
        self.percentile_lateness_ns(99)
    }

    /// Lateness at `percent` (capped at 100) over the retained window.
    pub fn percentile_lateness_ns(&mut self, percent: u8) -> u64 {
        let Some(last) = self.samples.len().checked_sub(1) else {
            return 0;
        };
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.samples);

        let percent = usize::from(percent.min(100));
        let rank = (last * percent + 50) / 100;
        let (_, value, _) = self.scratch.select_nth_unstable(rank.min(last));
        *value
    }

    /// Fraction of recorded frames that were missed.
    pub fn missed_ratio(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.missed_frames as f64 / self.total_frames as f64
    }

    pub fn reset(&mut self) {
        self.total_frames = 0;
        self.missed_frames = 0;
        self.max_lateness_ns = 0;
        self.last_lateness_ns = 0;
        self.samples.clear();
        self.next_index = 0;
    }
}
