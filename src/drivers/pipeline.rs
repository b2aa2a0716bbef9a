use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use crate::drivers::decoder::LineDecoder;
use crate::drivers::source::LineSource;
use crate::drivers::{CaptureError, CaptureWindow, SampleBuffer};
/// Where and under which names capture artifacts are written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSettings {
    pub folder: PathBuf,
    pub csv_stem: String,
    pub graph_name: String,
}
impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("captures"),
            csv_stem: "dados".into(),
            graph_name: "Movimento".into(),
        }
    }
}
/// Result of draining a source once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub accepted: usize,
    pub discarded: usize,
}
/// All mutable acquisition state, owned by the acquisition loop.
pub struct PipelineContext {
    buffer: SampleBuffer,
    decoder: LineDecoder,
    settings: ExportSettings,
    last_export_ok: Option<bool>,
}
impl PipelineContext {
    pub fn new(capacity: usize, decoder: LineDecoder, settings: ExportSettings) -> Self {
        Self {
            buffer: SampleBuffer::with_capacity(capacity),
            decoder,
            settings,
            last_export_ok: None,
        }
    }
    /// Reads everything the source has ready and appends the samples that decode.
    pub fn tick(&mut self, source: &mut dyn LineSource) -> Result<TickStats, CaptureError> {
        let mut stats = TickStats::default();
        for line in source.poll_lines()? {
            match self.decoder.decode(&line) {
                Some(sample) => {
                    self.buffer.append(sample);
                    stats.accepted += 1;
                }
                None => stats.discarded += 1,
            }
        }
        stats.discarded += source.take_dropped();
        Ok(stats)
    }
    pub fn capture(&self) -> CaptureWindow {
        self.buffer.snapshot()
    }
    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }
    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }
    pub fn record_export(&mut self, ok: bool) {
        self.last_export_ok = Some(ok);
    }
    /// `None` until the first export attempt finishes.
    pub fn last_export_ok(&self) -> Option<bool> {
        self.last_export_ok
    }
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
/// Fixed-interval periodic task clock.
pub struct Ticker {
    interval: Duration,
    next: Instant,
}
impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now() + interval,
        }
    }
    /// Sleeps until the next deadline. Deadlines that already passed are skipped, not replayed.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
            self.next += self.interval;
        } else {
            self.next = now + self.interval;
        }
    }
}
