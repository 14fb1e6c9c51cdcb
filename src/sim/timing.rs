//! Frame timing.

use std::collections::VecDeque;
use std::time::Duration;

/// Default number of frames averaged by [`FrameRate`].
pub const DEFAULT_FRAME_WINDOW: usize = 30;

/// Moving average over the most recent frame durations.
///
/// ```
/// use std::time::Duration;
/// use geomsim::sim::FrameRate;
///
/// let mut rate = FrameRate::new(2);
/// rate.push(Duration::from_millis(10));
/// rate.push(Duration::from_millis(30));
/// rate.push(Duration::from_millis(20));
/// assert_eq!(rate.average_frame_time(), Some(Duration::from_millis(25)));
/// ```
#[derive(Debug, Clone)]
pub struct FrameRate {
    frames: VecDeque<Duration>,
    capacity: usize,
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_WINDOW)
    }
}

impl FrameRate {
    /// Create a buffer averaging over `capacity` frames (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record one frame, dropping the oldest when full.
    pub fn push(&mut self, frame: Duration) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// Number of recorded frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Forget all recorded frames.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Mean frame duration, `None` when empty.
    pub fn average_frame_time(&self) -> Option<Duration> {
        if self.frames.is_empty() {
            return None;
        }
        let total: Duration = self.frames.iter().sum();
        Some(total / self.frames.len() as u32)
    }

    /// Frames per second from the mean duration; zero when empty or the mean is zero.
    pub fn fps(&self) -> f64 {
        match self.average_frame_time() {
            Some(d) if !d.is_zero() => 1.0 / d.as_secs_f64(),
            _ => 0.0,
        }
    }
}
