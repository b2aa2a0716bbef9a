use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use crate::drivers::sequence::{artifact_name, next_sequence, NameFilter};
use crate::drivers::{CaptureError, CaptureWindow};
pub const CSV_HEADER: &str = "Tempo,Tensão";
/// A file written by one export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    pub sequence_number: u32,
    pub path: PathBuf,
}
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported(ExportArtifact),
    /// The capture window held no samples; nothing was written.
    NothingToExport,
}
/// Writes capture windows as `<stem>_NNNN.csv` with time measured from the first sample.
pub struct CaptureExporter {
    stem: String,
}
impl CaptureExporter {
    pub fn new(stem: impl Into<String>) -> Self {
        Self { stem: stem.into() }
    }
    pub fn export(&self, window: &CaptureWindow, folder: &Path) -> Result<ExportOutcome, CaptureError> {
        if window.is_empty() {
            log::info!("capture window is empty, nothing to export");
            return Ok(ExportOutcome::NothingToExport);
        }
        let sequence_number = next_sequence(folder, &NameFilter::artifact(&self.stem, "csv"))?;
        let path = folder.join(artifact_name(&self.stem, sequence_number, "csv"));
        let write_err = |source| CaptureError::Write {
            path: path.clone(),
            source,
        };
        let file = File::create(&path).map_err(write_err)?;
        let mut w = BufWriter::new(file);
        w.write_all(&csv_bytes(window)).map_err(write_err)?;
        w.flush().map_err(write_err)?;
        log::info!("saved {} samples to {}", window.len(), path.display());
        Ok(ExportOutcome::Exported(ExportArtifact {
            sequence_number,
            path,
        }))
    }
}
impl Default for CaptureExporter {
    fn default() -> Self {
        Self::new("dados")
    }
}
/// CSV body for `window`. Depends only on the samples, never on the file name.
pub fn csv_bytes(window: &CaptureWindow) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 * (window.len() + 1));
    out.extend_from_slice(CSV_HEADER.as_bytes());
    out.push(b'\n');
    for (t, sample) in window.zero_based_times().into_iter().zip(&window.samples) {
        // `{:?}` always keeps a decimal point on the time column.
        out.extend_from_slice(format!("{:?},{}\n", t, sample.value).as_bytes());
    }
    out
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::Sample;
    fn two_sample_window() -> CaptureWindow {
        CaptureWindow::new(vec![Sample::new(5.0, 10.0), Sample::new(5.5, 20.0)])
    }
    #[test]
    fn writes_zero_based_rows_to_first_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = CaptureExporter::default()
            .export(&two_sample_window(), dir.path())
            .unwrap();
        let ExportOutcome::Exported(artifact) = outcome else {
            panic!("expected an artifact");
        };
        assert_eq!(artifact.sequence_number, 1);
        assert_eq!(artifact.path, dir.path().join("dados_0001.csv"));
        let text = std::fs::read_to_string(&artifact.path).unwrap();
        assert_eq!(text, "Tempo,Tensão\n0.0,10\n0.5,20\n");
    }
    #[test]
    fn exporting_twice_gives_identical_content() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CaptureExporter::default();
        let window = two_sample_window();
        let first = exporter.export(&window, dir.path()).unwrap();
        let second = exporter.export(&window, dir.path()).unwrap();
        let (ExportOutcome::Exported(a), ExportOutcome::Exported(b)) = (first, second) else {
            panic!("expected two artifacts");
        };
        assert_eq!(b.sequence_number, 2);
        assert_eq!(std::fs::read(&a.path).unwrap(), std::fs::read(&b.path).unwrap());
    }
    #[test]
    fn empty_window_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = CaptureExporter::default()
            .export(&CaptureWindow::default(), dir.path())
            .unwrap();
        assert_eq!(outcome, ExportOutcome::NothingToExport);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
    #[test]
    fn single_sample_window_exports() {
        let dir = tempfile::tempdir().unwrap();
        let window = CaptureWindow::new(vec![Sample::new(3.0, 700.0)]);
        let outcome = CaptureExporter::default().export(&window, dir.path()).unwrap();
        assert!(matches!(outcome, ExportOutcome::Exported(_)));
    }
    #[test]
    fn unwritable_folder_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = CaptureExporter::default()
            .export(&two_sample_window(), &missing)
            .unwrap_err();
        assert!(matches!(err, CaptureError::FolderScan { .. }));
    }
}
