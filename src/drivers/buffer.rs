use std::collections::VecDeque;
/// Number of samples kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 5000;
/// One decoded measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Seconds since the UNIX epoch.
    pub timestamp: f64,
    pub value: f64,
}
impl Sample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}
/// Frozen copy of the buffer taken when a capture is requested.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CaptureWindow {
    pub samples: Vec<Sample>,
}
impl CaptureWindow {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    /// Seconds between the first and the last sample.
    pub fn duration_seconds(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }
    /// Timestamps shifted so the first sample sits at zero.
    pub fn zero_based_times(&self) -> Vec<f64> {
        let t0 = self.samples.first().map(|s| s.timestamp).unwrap_or(0.0);
        self.samples.iter().map(|s| s.timestamp - t0).collect()
    }
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }
}
/// Rolling buffer holding the most recent samples in arrival order.
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}
impl SampleBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn append(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }
    pub fn snapshot(&self) -> CaptureWindow {
        CaptureWindow {
            samples: self.samples.iter().copied().collect(),
        }
    }
    /// Values of the newest `count` samples, oldest first.
    pub fn recent_values(&self, count: usize) -> Vec<f64> {
        let skip = self.samples.len().saturating_sub(count);
        self.samples.iter().skip(skip).map(|s| s.value).collect()
    }
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
impl Default for SampleBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
