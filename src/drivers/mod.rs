// src/drivers/mod.rs
// 采集 -> 缓冲 -> 导出 流水线
pub mod buffer;
pub mod decoder;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod plot;
pub mod sequence;
pub mod source;
pub mod spectrogram;
pub mod worker;
// 公开导出常用类型，方便外部调用
pub use buffer::{CaptureWindow, Sample, SampleBuffer};
pub use decoder::LineDecoder;
pub use error::CaptureError;
pub use export::ExportOutcome;
pub use pipeline::{ExportSettings, PipelineContext, Ticker};
pub use source::{LineSource, SerialLineSource, SimulatedSource};
pub use worker::{ExportReport, ExportWorker, WorkerEvent};
