use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to scan output folder {folder}: {source}")]
    FolderScan {
        folder: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("insufficient duration for spectral analysis ({samples} samples spanning {seconds} s)")]
    DegenerateDuration { samples: usize, seconds: f64 },
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error("serial link error: {0}")]
    Serial(String),
    #[error("export did not finish within {0:?}")]
    Timeout(Duration),
    #[error("export worker is not running")]
    WorkerGone,
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for CaptureError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        CaptureError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for CaptureError {
    fn from(value: image::ImageError) -> Self {
        CaptureError::Plot(value.to_string())
    }
}
impl From<serialport::Error> for CaptureError {
    fn from(value: serialport::Error) -> Self {
        CaptureError::Serial(value.to_string())
    }
}
