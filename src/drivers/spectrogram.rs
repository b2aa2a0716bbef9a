use ndarray::Array2;
use rustfft::{num_complex::Complex64, FftPlanner};
use crate::drivers::{CaptureError, CaptureWindow};
/// Samples per analysis segment.
pub const SEGMENT_LEN: usize = 256;
/// Samples shared by consecutive segments.
pub const SEGMENT_OVERLAP: usize = 128;
/// Added before taking the logarithm so silent cells stay finite.
pub const DB_EPSILON: f64 = 1e-8;
/// Despeckled power spectrogram of a capture window.
#[derive(Clone, Debug)]
pub struct Spectrogram {
    pub sample_rate_hz: f64,
    pub frequencies_hz: Vec<f64>,
    /// Centre of each segment, in seconds from the first sample.
    pub times_s: Vec<f64>,
    /// Rows are frequency bins, columns are segments.
    pub power_db: Array2<f64>,
}
impl Spectrogram {
    pub fn db_range(&self) -> (f64, f64) {
        self.power_db
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}
/// Effective rate: sample count divided by the covered time span.
pub fn sampling_rate(window: &CaptureWindow) -> Result<f64, CaptureError> {
    let seconds = window.duration_seconds();
    if seconds <= 0.0 || !seconds.is_finite() {
        return Err(CaptureError::DegenerateDuration {
            samples: window.len(),
            seconds,
        });
    }
    Ok(window.len() as f64 / seconds)
}
/// Symmetric Hann window.
pub fn hann(len: usize) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * n as f64 / denom).cos())
        .collect()
}
/// Short-time Fourier transform producing one-sided power spectral density.
pub struct SpectrogramBuilder {
    segment_len: usize,
    overlap: usize,
    window: Vec<f64>,
}
impl SpectrogramBuilder {
    pub fn new(segment_len: usize, overlap: usize) -> Self {
        let segment_len = segment_len.max(2);
        Self {
            segment_len,
            overlap: overlap.min(segment_len - 1),
            window: hann(segment_len),
        }
    }
    pub fn frequencies(&self, sample_rate_hz: f64) -> Vec<f64> {
        (0..=self.segment_len / 2)
            .map(|k| k as f64 * sample_rate_hz / self.segment_len as f64)
            .collect()
    }
    /// Returns segment centre times and the power matrix (frequency x segment).
    pub fn power(&self, values: &[f64], sample_rate_hz: f64) -> (Vec<f64>, Array2<f64>) {
        let n = self.segment_len;
        let step = n - self.overlap;
        let mut padded = values.to_vec();
        if padded.len() < n {
            padded.resize(n, 0.0);
        }
        let segments = (padded.len() - n) / step + 1;
        let bins = n / 2 + 1;
        let window_power: f64 = self.window.iter().map(|w| w * w).sum();
        let scale = 1.0 / (sample_rate_hz * window_power);
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n);
        let mut power = Array2::<f64>::zeros((bins, segments));
        let mut buffer = vec![Complex64::new(0.0, 0.0); n];
        for seg in 0..segments {
            let start = seg * step;
            for (slot, (x, w)) in buffer
                .iter_mut()
                .zip(padded[start..start + n].iter().zip(&self.window))
            {
                *slot = Complex64::new(x * w, 0.0);
            }
            fft.process(&mut buffer);
            for k in 0..bins {
                let mut p = buffer[k].norm_sqr() * scale;
                // One-sided density: fold the negative frequencies in, except DC and Nyquist.
                if k != 0 && !(n % 2 == 0 && k == n / 2) {
                    p *= 2.0;
                }
                power[[k, seg]] = p;
            }
        }
        let times = (0..segments)
            .map(|seg| (seg * step + n / 2) as f64 / sample_rate_hz)
            .collect();
        (times, power)
    }
}
impl Default for SpectrogramBuilder {
    fn default() -> Self {
        Self::new(SEGMENT_LEN, SEGMENT_OVERLAP)
    }
}
/// 3x3 median over the matrix, treating cells outside the edges as zero.
pub fn median_filter_3x3(input: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = input.dim();
    let mut out = Array2::<f64>::zeros((rows, cols));
    let mut neighbourhood = [0.0f64; 9];
    for r in 0..rows {
        for c in 0..cols {
            let mut idx = 0;
            for dr in -1i64..=1 {
                for dc in -1i64..=1 {
                    let rr = r as i64 + dr;
                    let cc = c as i64 + dc;
                    let inside = rr >= 0 && cc >= 0 && (rr as usize) < rows && (cc as usize) < cols;
                    neighbourhood[idx] = if inside {
                        input[[rr as usize, cc as usize]]
                    } else {
                        0.0
                    };
                    idx += 1;
                }
            }
            neighbourhood.sort_by(|a, b| a.total_cmp(b));
            out[[r, c]] = neighbourhood[4];
        }
    }
    out
}
pub fn to_decibels(power: &Array2<f64>) -> Array2<f64> {
    power.mapv(|p| 10.0 * (p + DB_EPSILON).log10())
}
/// Full analysis chain: rate estimate, STFT, despeckling, dB conversion.
pub fn analyze(window: &CaptureWindow) -> Result<Spectrogram, CaptureError> {
    let sample_rate_hz = sampling_rate(window)?;
    let builder = SpectrogramBuilder::default();
    let (times_s, power) = builder.power(&window.values(), sample_rate_hz);
    let power_db = to_decibels(&median_filter_3x3(&power));
    Ok(Spectrogram {
        sample_rate_hz,
        frequencies_hz: builder.frequencies(sample_rate_hz),
        times_s,
        power_db,
    })
}
