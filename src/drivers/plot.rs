use std::fs;
use std::io::Cursor;
use std::path::Path;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::coord::Shift;
use plotters::prelude::*;
use crate::drivers::export::{ExportArtifact, ExportOutcome};
use crate::drivers::sequence::{artifact_name, next_sequence, NameFilter};
use crate::drivers::spectrogram::{analyze, Spectrogram};
use crate::drivers::{CaptureError, CaptureWindow};
type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub trace: RGBColor,
    /// Fixed value axis of the waveform panel.
    pub value_range: (f64, f64),
    pub colorbar_width: u32,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1000,
            background: WHITE,
            trace: RED,
            value_range: (0.0, 1000.0),
            colorbar_width: 120,
        }
    }
}
/// Writes `<base_name>_NNNN.png` holding the waveform and its spectrogram.
pub struct SpectrogramRenderer {
    style: PlotStyle,
}
impl SpectrogramRenderer {
    pub fn new(style: PlotStyle) -> Self {
        Self { style }
    }
    pub fn render(
        &self,
        window: &CaptureWindow,
        folder: &Path,
        base_name: &str,
    ) -> Result<ExportOutcome, CaptureError> {
        if window.is_empty() {
            log::info!("capture window is empty, no graph rendered");
            return Ok(ExportOutcome::NothingToExport);
        }
        let spectrogram = analyze(window)?;
        let sequence_number = next_sequence(folder, &NameFilter::artifact(base_name, "png"))?;
        let path = folder.join(artifact_name(base_name, sequence_number, "png"));
        let png = render_capture_png(window, &spectrogram, &self.style)?;
        fs::write(&path, png).map_err(|source| CaptureError::Write {
            path: path.clone(),
            source,
        })?;
        log::info!(
            "saved graph {} ({:.1} Hz, {} segments)",
            path.display(),
            spectrogram.sample_rate_hz,
            spectrogram.times_s.len()
        );
        Ok(ExportOutcome::Exported(ExportArtifact {
            sequence_number,
            path,
        }))
    }
}
impl Default for SpectrogramRenderer {
    fn default() -> Self {
        Self::new(PlotStyle::default())
    }
}
/// Rasterizes the waveform above the pseudocolor spectrogram and encodes a PNG.
pub fn render_capture_png(
    window: &CaptureWindow,
    spectrogram: &Spectrogram,
    style: &PlotStyle,
) -> Result<Vec<u8>, CaptureError> {
    let times = window.zero_based_times();
    let t_last = times.last().copied().unwrap_or(0.0);
    if t_last <= 0.0 {
        return Err(CaptureError::DegenerateDuration {
            samples: window.len(),
            seconds: t_last,
        });
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let (upper, lower) = root.split_vertically(style.height / 2);
        draw_waveform(&upper, &times, &window.values(), t_last, style)?;
        let (heatmap, legend) =
            lower.split_horizontally(style.width.saturating_sub(style.colorbar_width));
        let db_bounds = padded_range(spectrogram.db_range());
        let gradient = colorgrad::inferno();
        draw_spectrogram(&heatmap, spectrogram, t_last, db_bounds, &gradient)?;
        draw_colorbar(&legend, db_bounds, &gradient)?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn draw_waveform(
    area: &Panel<'_>,
    times: &[f64],
    values: &[f64],
    t_last: f64,
    style: &PlotStyle,
) -> Result<(), CaptureError> {
    let (y_lo, y_hi) = style.value_range;
    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .caption("Forma de Onda", ("sans-serif", 22))
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(0f64..t_last, y_lo..y_hi)?;
    chart
        .configure_mesh()
        .light_line_style(&BLACK.mix(0.05))
        .x_desc("Tempo [s]")
        .y_desc("Resposta do ADC")
        .draw()?;
    let series = times.iter().copied().zip(values.iter().copied());
    chart.draw_series(LineSeries::new(series, &style.trace))?;
    Ok(())
}
fn draw_spectrogram(
    area: &Panel<'_>,
    spectrogram: &Spectrogram,
    t_last: f64,
    db_bounds: (f64, f64),
    gradient: &colorgrad::Gradient,
) -> Result<(), CaptureError> {
    let f_lo = spectrogram.frequencies_hz.first().copied().unwrap_or(0.0);
    let f_hi = spectrogram.frequencies_hz.last().copied().unwrap_or(1.0);
    let mut chart = ChartBuilder::on(area)
        .margin(15)
        .caption("Pseudocolor", ("sans-serif", 22))
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 45)
        .build_cartesian_2d(0f64..t_last, f_lo..f_hi)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Tempo [s]")
        .y_desc("Frequência [Hz]")
        .draw()?;
    // Cells stretch evenly over the plot extent, like an image with explicit bounds.
    let (rows, cols) = spectrogram.power_db.dim();
    let dx = t_last / cols as f64;
    let dy = (f_hi - f_lo) / rows as f64;
    chart.draw_series(spectrogram.power_db.indexed_iter().map(|((r, c), &db)| {
        let x0 = c as f64 * dx;
        let y0 = f_lo + r as f64 * dy;
        Rectangle::new(
            [(x0, y0), (x0 + dx, y0 + dy)],
            colour_at(gradient, db, db_bounds).filled(),
        )
    }))?;
    Ok(())
}
fn draw_colorbar(
    area: &Panel<'_>,
    (lo, hi): (f64, f64),
    gradient: &colorgrad::Gradient,
) -> Result<(), CaptureError> {
    let mut chart = ChartBuilder::on(area)
        .margin_top(50)
        .margin_bottom(60)
        .margin_right(5)
        .set_label_area_size(LabelAreaPosition::Right, 75)
        .build_cartesian_2d(0f64..1f64, lo..hi)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc("Intensidade [dB]")
        .draw()?;
    let steps = 64;
    let step = (hi - lo) / steps as f64;
    chart.draw_series((0..steps).map(|i| {
        let y0 = lo + i as f64 * step;
        Rectangle::new(
            [(0.0, y0), (1.0, y0 + step)],
            colour_at(gradient, y0 + step / 2.0, (lo, hi)).filled(),
        )
    }))?;
    Ok(())
}
fn colour_at(gradient: &colorgrad::Gradient, db: f64, (lo, hi): (f64, f64)) -> RGBColor {
    let t = if db.is_finite() {
        ((db - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let [r, g, b, _] = gradient.at(t).to_rgba8();
    RGBColor(r, g, b)
}
/// Widens empty or flat ranges so the colour axis always has extent.
fn padded_range((lo, hi): (f64, f64)) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (-81.0, -79.0);
    }
    if hi - lo < 1e-9 {
        return (lo - 1.0, hi + 1.0);
    }
    (lo, hi)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, CaptureError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| CaptureError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::Sample;
    fn ramp_window(count: usize) -> CaptureWindow {
        CaptureWindow::new(
            (0..count)
                .map(|i| Sample::new(10.0 + i as f64 * 0.002, (i % 97) as f64 * 10.0))
                .collect(),
        )
    }
    #[test]
    fn renders_png_bytes() {
        let window = ramp_window(600);
        let spectrogram = analyze(&window).unwrap();
        let style = PlotStyle {
            width: 600,
            height: 500,
            ..PlotStyle::default()
        };
        let png = render_capture_png(&window, &spectrogram, &style).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
    #[test]
    fn render_writes_sequenced_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Movimento_0003.png"), b"").unwrap();
        let outcome = SpectrogramRenderer::default()
            .render(&ramp_window(400), dir.path(), "Movimento")
            .unwrap();
        let ExportOutcome::Exported(artifact) = outcome else {
            panic!("expected an artifact");
        };
        assert_eq!(artifact.sequence_number, 4);
        assert_eq!(artifact.path, dir.path().join("Movimento_0004.png"));
        assert!(std::fs::metadata(&artifact.path).unwrap().len() > 0);
    }
    #[test]
    fn single_sample_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let window = CaptureWindow::new(vec![Sample::new(1.0, 300.0)]);
        let err = SpectrogramRenderer::default()
            .render(&window, dir.path(), "Movimento")
            .unwrap_err();
        assert!(matches!(err, CaptureError::DegenerateDuration { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
    #[test]
    fn empty_window_renders_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = SpectrogramRenderer::default()
            .render(&CaptureWindow::default(), dir.path(), "Movimento")
            .unwrap();
        assert_eq!(outcome, ExportOutcome::NothingToExport);
    }
    #[test]
    fn non_finite_values_still_render() {
        let dir = tempfile::tempdir().unwrap();
        let mut window = ramp_window(400);
        window.samples[10].value = f64::NAN;
        window.samples[200].value = f64::INFINITY;
        window.samples[300].value = f64::NEG_INFINITY;
        let outcome = SpectrogramRenderer::default()
            .render(&window, dir.path(), "Movimento")
            .unwrap();
        let ExportOutcome::Exported(artifact) = outcome else {
            panic!("expected an artifact");
        };
        assert_eq!(artifact.path, dir.path().join("Movimento_0001.png"));
        let bytes = std::fs::read(&artifact.path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
    #[test]
    fn flat_ranges_are_widened() {
        assert_eq!(padded_range((-80.0, -80.0)), (-81.0, -79.0));
        assert_eq!(padded_range((f64::INFINITY, f64::NEG_INFINITY)), (-81.0, -79.0));
        assert_eq!(padded_range((-10.0, 5.0)), (-10.0, 5.0));
    }
}
