use std::collections::VecDeque;
use std::f64::consts::PI;
use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};
use rand::Rng;
use serialport::SerialPort;
use crate::drivers::CaptureError;
/// Longest line kept while waiting for its `\n`. Anything longer is noise.
pub const MAX_LINE_LEN: usize = 256;
/// Anything that can hand over the raw lines that arrived since the last poll.
pub trait LineSource {
    fn poll_lines(&mut self) -> Result<Vec<Vec<u8>>, CaptureError>;
    /// Lines thrown away before reaching the decoder since the last call.
    fn take_dropped(&mut self) -> usize {
        0
    }
}
/// Splits a byte stream on `\n`, holding back the trailing partial line.
///
/// A line that grows past [`MAX_LINE_LEN`] is dropped whole, up to and including its
/// terminating `\n`.
#[derive(Default, Debug)]
pub struct LineAssembler {
    pending: Vec<u8>,
    overflowing: bool,
    dropped: usize,
}
impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                if self.overflowing {
                    self.overflowing = false;
                } else {
                    lines.push(std::mem::take(&mut self.pending));
                }
            } else if self.overflowing {
                continue;
            } else if self.pending.len() >= MAX_LINE_LEN {
                log::debug!("dropping line longer than {MAX_LINE_LEN} bytes");
                self.pending.clear();
                self.overflowing = true;
                self.dropped += 1;
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }
    pub fn take_dropped(&mut self) -> usize {
        std::mem::take(&mut self.dropped)
    }
}
/// Line source backed by a real serial port.
pub struct SerialLineSource {
    port: Box<dyn SerialPort>,
    assembler: LineAssembler,
    scratch: Vec<u8>,
}
impl SerialLineSource {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, CaptureError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(10))
            .open()?;
        log::info!("opened serial port {port_name} at {baud_rate} baud");
        Ok(Self {
            port,
            assembler: LineAssembler::new(),
            scratch: vec![0u8; 4096],
        })
    }
}
impl LineSource for SerialLineSource {
    fn poll_lines(&mut self) -> Result<Vec<Vec<u8>>, CaptureError> {
        let mut lines = Vec::new();
        loop {
            let available = self.port.bytes_to_read()? as usize;
            if available == 0 {
                break;
            }
            let take = available.min(self.scratch.len());
            match self.port.read(&mut self.scratch[..take]) {
                Ok(0) => break,
                Ok(read) => lines.extend(self.assembler.push(&self.scratch[..read])),
                Err(err) if err.kind() == ErrorKind::TimedOut => break,
                Err(err) => return Err(CaptureError::Serial(err.to_string())),
            }
        }
        Ok(lines)
    }
    fn take_dropped(&mut self) -> usize {
        self.assembler.take_dropped()
    }
}
/// Synthetic ADC stream for running without hardware.
pub struct SimulatedSource {
    rate_hz: f64,
    started_at: Instant,
    emitted: u64,
}
impl SimulatedSource {
    pub fn new(rate_hz: f64) -> Self {
        Self {
            rate_hz: rate_hz.max(1.0),
            started_at: Instant::now(),
            emitted: 0,
        }
    }
    fn level_at(&self, t: f64, rng: &mut impl Rng) -> f64 {
        let carrier = 180.0 * (2.0 * PI * 12.0 * t).sin();
        // A 40 Hz burst for half of every two-second period.
        let burst = if t % 2.0 < 1.0 {
            90.0 * (2.0 * PI * 40.0 * t).sin()
        } else {
            0.0
        };
        let noise: f64 = rng.gen_range(-15.0..15.0);
        (512.0 + carrier + burst + noise).clamp(0.0, 1023.0).round()
    }
}
impl LineSource for SimulatedSource {
    fn poll_lines(&mut self) -> Result<Vec<Vec<u8>>, CaptureError> {
        let due = (self.started_at.elapsed().as_secs_f64() * self.rate_hz) as u64;
        let mut rng = rand::thread_rng();
        let mut lines = Vec::new();
        while self.emitted < due {
            let t = self.emitted as f64 / self.rate_hz;
            self.emitted += 1;
            if rng.gen_ratio(1, 500) {
                lines.push(b"\xff\x1a".to_vec());
                continue;
            }
            let level = self.level_at(t, &mut rng);
            lines.push(format!("{level}\r").into_bytes());
        }
        Ok(lines)
    }
}
/// In-memory source for deterministic playback in tests.
#[cfg(test)]
pub struct ManualSource {
    queue: VecDeque<Vec<Vec<u8>>>,
}
#[cfg(test)]
impl ManualSource {
    pub fn new(polls: impl IntoIterator<Item = Vec<Vec<u8>>>) -> Self {
        Self {
            queue: polls.into_iter().collect(),
        }
    }
}
#[cfg(test)]
impl LineSource for ManualSource {
    fn poll_lines(&mut self) -> Result<Vec<Vec<u8>>, CaptureError> {
        Ok(self.queue.pop_front().unwrap_or_default())
    }
}
