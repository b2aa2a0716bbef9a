// src/engine.rs
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use crate::config::ScopeConfig;
use crate::drivers::{
    CaptureError, ExportOutcome, ExportReport, ExportWorker, LineDecoder, LineSource,
    PipelineContext, SerialLineSource, SimulatedSource, Ticker, WorkerEvent,
};
use crate::types::*;
// 模拟模式的采样率
const SIMULATED_RATE_HZ: f64 = 1000.0;
// 绘图数据推送间隔 (~30 Hz)
const PUBLISH_INTERVAL: Duration = Duration::from_millis(33);
/// Acquisition loop state. Lives entirely on the engine thread.
pub struct Engine {
    config: ScopeConfig,
    ctx: PipelineContext,
    source: Option<Box<dyn LineSource>>,
    worker: ExportWorker,
    tx: Sender<EngineMessage>,
    last_publish: Instant,
}
impl Engine {
    pub fn new(config: ScopeConfig, tx: Sender<EngineMessage>) -> Self {
        let ctx = PipelineContext::new(
            config.buffer_capacity,
            LineDecoder::default(),
            config.export_settings(),
        );
        let worker = ExportWorker::spawn(config.export_timeout());
        Self {
            config,
            ctx,
            source: None,
            worker,
            tx,
            last_publish: Instant::now(),
        }
    }
    fn log(&self, msg: impl Into<String>) {
        let msg = msg.into();
        log::info!("{msg}");
        self.tx.send(EngineMessage::Log(msg)).ok();
    }
    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }
    pub fn attach_source(&mut self, source: Box<dyn LineSource>) {
        self.source = Some(source);
        self.tx.send(EngineMessage::Status(true)).ok();
    }
    /// Applies one GUI command. Returns `false` when the loop should stop.
    pub fn handle(&mut self, cmd: GuiCommand) -> bool {
        match cmd {
            GuiCommand::Connect(mode) => self.connect(mode),
            GuiCommand::Disconnect => {
                if self.source.take().is_some() {
                    self.log("🛑 Disconnected");
                }
                self.tx.send(EngineMessage::Status(false)).ok();
            }
            GuiCommand::Capture => self.request_capture(),
            GuiCommand::ClearBuffer => self.ctx.reset(),
            GuiCommand::Shutdown => {
                if self.worker.has_pending() {
                    self.log("Waiting for the running export to finish");
                }
                return false;
            }
        }
        true
    }
    fn connect(&mut self, mode: ConnectionMode) {
        if self.is_connected() {
            return;
        }
        match mode {
            ConnectionMode::Simulation => {
                self.attach_source(Box::new(SimulatedSource::new(SIMULATED_RATE_HZ)));
                self.log("✅ Sim Connected");
            }
            ConnectionMode::Hardware => {
                match SerialLineSource::open(&self.config.serial_port, self.config.baud_rate) {
                    Ok(source) => {
                        self.attach_source(Box::new(source));
                        self.log(format!("✅ Connected to {}", self.config.serial_port));
                    }
                    Err(err) => {
                        self.log(format!("❌ Connect failed: {err}"));
                        self.tx.send(EngineMessage::Status(false)).ok();
                    }
                }
            }
        }
    }
    fn request_capture(&mut self) {
        let window = self.ctx.capture();
        if window.is_empty() {
            self.log("No data available to save");
            return;
        }
        let samples = window.len();
        match self.worker.submit(window, self.ctx.settings().clone()) {
            Ok(id) => log::debug!("queued export job {id} with {samples} samples"),
            Err(err) => self.report_failure(err),
        }
    }
    fn report_failure(&mut self, err: CaptureError) {
        self.log(format!("❌ Export failed: {err}"));
        self.ctx.record_export(false);
        self.publish_export_status();
    }
    fn apply_report(&mut self, report: ExportReport) {
        if report.nothing_exported() {
            self.log("No data available to save");
            return;
        }
        for (kind, result) in [("CSV", &report.csv), ("Graph", &report.graph)] {
            match result {
                Ok(ExportOutcome::Exported(artifact)) => {
                    self.log(format!(
                    "💾 {kind} #{} saved: {}",
                    artifact.sequence_number,
                    artifact.path.display()
                ))
                }
                Ok(ExportOutcome::NothingToExport) => {}
                Err(err) => self.log(format!("❌ {kind} export failed: {err}")),
            }
        }
        self.ctx.record_export(report.succeeded());
        self.publish_export_status();
    }
    fn publish_export_status(&self) {
        if let Some(ok) = self.ctx.last_export_ok() {
            self.tx.send(EngineMessage::ExportStatus(ok)).ok();
        }
    }
    /// One acquisition tick: drain the source, collect export results, refresh the display.
    pub fn step(&mut self) {
        let polled = match self.source.as_mut() {
            Some(source) => Some(self.ctx.tick(&mut **source)),
            None => None,
        };
        match polled {
            Some(Ok(stats)) if stats.discarded > 0 => {
                log::debug!("{} lines accepted, {} discarded", stats.accepted, stats.discarded)
            }
            Some(Err(err)) => {
                self.source = None;
                self.log(format!("❌ Link lost: {err}"));
                self.tx.send(EngineMessage::Status(false)).ok();
            }
            _ => {}
        }
        for event in self.worker.poll() {
            match event {
                WorkerEvent::Finished(report) => self.apply_report(report),
                WorkerEvent::TimedOut { id, after } => {
                    log::warn!("export job {id} timed out");
                    self.report_failure(CaptureError::Timeout(after));
                }
            }
        }
        if self.is_connected() && self.last_publish.elapsed() >= PUBLISH_INTERVAL {
            self.last_publish = Instant::now();
            let values = self.ctx.buffer().recent_values(self.ctx.buffer().capacity());
            self.tx.send(EngineMessage::Samples(values)).ok();
        }
    }
}
pub fn spawn_thread(
    config: ScopeConfig,
    tx: Sender<EngineMessage>,
    rx_cmd: Receiver<GuiCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let interval = config.poll_interval();
        let mut engine = Engine::new(config, tx);
        engine.log("⚙️ Acquisition engine ready.");
        let mut ticker = Ticker::new(interval);
        loop {
            // 1. 消息处理 (处理 GUI 发来的命令)
            loop {
                match rx_cmd.try_recv() {
                    Ok(cmd) => {
                        if !engine.handle(cmd) {
                            return;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }
            // 2. 数据采集
            engine.step();
            ticker.wait();
        }
    })
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::source::ManualSource;
    use std::sync::mpsc::channel;
    fn engine_in(folder: &std::path::Path) -> (Engine, Receiver<EngineMessage>) {
        let (tx, rx) = channel();
        let config = ScopeConfig {
            output_folder: folder.to_path_buf(),
            ..ScopeConfig::default()
        };
        (Engine::new(config, tx), rx)
    }
    fn wait_for_export_status(engine: &mut Engine, rx: &Receiver<EngineMessage>) -> Option<bool> {
        let started = Instant::now();
        while started.elapsed() < Duration::from_secs(20) {
            engine.step();
            for msg in rx.try_iter() {
                if let EngineMessage::ExportStatus(ok) = msg {
                    return Some(ok);
                }
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }
    #[test]
    fn empty_capture_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, rx) = engine_in(dir.path());
        assert!(engine.handle(GuiCommand::Capture));
        engine.step();
        let messages: Vec<_> = rx.try_iter().collect();
        assert!(messages
            .iter()
            .any(|m| matches!(m, EngineMessage::Log(s) if s.contains("No data"))));
        assert!(!messages
            .iter()
            .any(|m| matches!(m, EngineMessage::ExportStatus(_))));
    }
    #[test]
    fn single_sample_capture_saves_csv_and_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, rx) = engine_in(dir.path());
        engine.attach_source(Box::new(ManualSource::new(vec![vec![
            b"garbage".to_vec(),
            b"512\r".to_vec(),
        ]])));
        engine.step();
        engine.handle(GuiCommand::Capture);
        assert_eq!(wait_for_export_status(&mut engine, &rx), Some(false));
        assert!(dir.path().join("dados_0001.csv").exists());
        assert_eq!(engine.ctx.last_export_ok(), Some(false));
    }
    #[test]
    fn disconnect_and_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, rx) = engine_in(dir.path());
        engine.attach_source(Box::new(ManualSource::new(Vec::new())));
        assert!(engine.is_connected());
        assert!(engine.handle(GuiCommand::Disconnect));
        assert!(!engine.is_connected());
        assert!(!engine.handle(GuiCommand::Shutdown));
        let statuses: Vec<bool> = rx
            .try_iter()
            .filter_map(|m| match m {
                EngineMessage::Status(b) => Some(b),
                _ => None,
            })
            .collect();
        assert_eq!(statuses, vec![true, false]);
    }
}
