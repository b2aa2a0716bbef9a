use std::time::{Instant, SystemTime, UNIX_EPOCH};
use crate::drivers::Sample;
/// Wall-clock anchored clock that never runs backwards within a session.
#[derive(Clone, Copy, Debug)]
pub struct AcquisitionClock {
    wall_origin: f64,
    started_at: Instant,
}
impl AcquisitionClock {
    pub fn start() -> Self {
        let wall_origin = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self {
            wall_origin,
            started_at: Instant::now(),
        }
    }
    /// Seconds since the UNIX epoch.
    pub fn now(&self) -> f64 {
        self.wall_origin + self.started_at.elapsed().as_secs_f64()
    }
}
/// Turns raw serial lines into samples. Lines that do not hold a number are dropped.
pub struct LineDecoder {
    clock: AcquisitionClock,
}
impl LineDecoder {
    pub fn new(clock: AcquisitionClock) -> Self {
        Self { clock }
    }
    pub fn decode(&self, line: &[u8]) -> Option<Sample> {
        decode_at(line, self.clock.now())
    }
}
impl Default for LineDecoder {
    fn default() -> Self {
        Self::new(AcquisitionClock::start())
    }
}
/// Decodes `line` and stamps the result with `timestamp`.
///
/// Bytes are mapped one-to-one onto Latin-1 characters, so text decoding cannot fail;
/// only the numeric parse can reject a line.
pub fn decode_at(line: &[u8], timestamp: f64) -> Option<Sample> {
    let text = latin1(line);
    match text.trim().parse::<f64>() {
        Ok(value) => Some(Sample::new(timestamp, value)),
        Err(_) => {
            log::trace!("discarding malformed line {text:?}");
            None
        }
    }
}
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn parses_numeric_lines() {
        assert_eq!(decode_at(b"512\r\n", 1.0), Some(Sample::new(1.0, 512.0)));
        assert_eq!(decode_at(b"  -3.25 ", 2.0), Some(Sample::new(2.0, -3.25)));
        assert_eq!(decode_at(b"1e3", 0.0).map(|s| s.value), Some(1000.0));
        assert_eq!(decode_at(b"+7", 0.0).map(|s| s.value), Some(7.0));
    }
    #[test]
    fn discards_malformed_lines() {
        let garbage: [&[u8]; 7] = [
            b"",
            b"\r\n",
            b"abc",
            b"12.3.4",
            b"\xff\xfe\x00",
            b"1\x002",
            b"--1",
        ];
        for line in garbage {
            assert_eq!(decode_at(line, 0.0), None, "line {line:?}");
        }
    }
    #[test]
    fn tolerates_single_bytes_and_high_bit_noise() {
        for byte in 0u8..=255 {
            let decoded = decode_at(&[byte], 0.0);
            if byte.is_ascii_digit() {
                assert_eq!(decoded.map(|s| s.value), Some((byte - b'0') as f64));
            } else {
                assert_eq!(decoded, None, "byte {byte:#x}");
            }
        }
    }
    #[test]
    fn latin1_maps_every_byte() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let text = latin1(&bytes);
        assert_eq!(text.chars().count(), 256);
        assert_eq!(text.chars().nth(0xe9), Some('é'));
    }
    #[test]
    fn decoder_stamps_monotonic_times() {
        let decoder = LineDecoder::default();
        let first = decoder.decode(b"1").unwrap();
        let second = decoder.decode(b"2").unwrap();
        assert!(second.timestamp >= first.timestamp);
        assert!(first.timestamp > 1.0e9);
    }
}
