// src/gui.rs
use eframe::egui;
use egui::Color32;
use egui_plot::{Line, Plot, PlotPoints};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::JoinHandle;
use crate::config::ScopeConfig;
use crate::engine;
use crate::types::*;

pub struct ScopeApp {
    // 系统状态
    is_connected: bool,
    export_ok: bool,
    connection_mode: ConnectionMode,
    y_max: f64,

    // 数据流
    samples: Vec<f64>,

    // 界面日志
    log_messages: Vec<String>,

    // 通讯管道
    rx: Receiver<EngineMessage>,
    tx_cmd: Sender<GuiCommand>,
    engine: Option<JoinHandle<()>>,
}

impl ScopeApp {
    pub fn new(config: ScopeConfig) -> Self {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        let y_max = config.display_y_max;

        // 启动后台采集引擎
        let handle = engine::spawn_thread(config, tx, rx_cmd);

        Self {
            is_connected: false,
            export_ok: false,
            connection_mode: ConnectionMode::Simulation,
            y_max,
            samples: Vec::new(),
            log_messages: vec!["Serial Scope ready. Press SPACE to capture.".to_owned()],
            rx,
            tx_cmd,
            engine: Some(handle),
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 12 { self.log_messages.remove(0); }
    }

    fn send(&self, cmd: GuiCommand) {
        if self.tx_cmd.send(cmd).is_err() {
            log::error!("acquisition engine is gone");
        }
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                EngineMessage::Log(s) => self.log(&s),
                EngineMessage::Status(b) => self.is_connected = b,
                EngineMessage::Samples(values) => self.samples = values,
                EngineMessage::ExportStatus(ok) => self.export_ok = ok,
            }
        }
    }
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 键盘触发: 松开空格键导出当前窗口
        if ctx.input(|i| i.key_released(egui::Key::Space)) {
            self.send(GuiCommand::Capture);
        }

        // 2. 消息处理
        self.drain_messages();
        if self.is_connected { ctx.request_repaint(); }

        // 3. UI 绘制
        egui::SidePanel::left("L").min_width(260.0).show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading("Serial Scope");
            ui.separator();

            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.connection_mode, ConnectionMode::Simulation, "SIM");
                ui.selectable_value(&mut self.connection_mode, ConnectionMode::Hardware, "REAL");
            });

            let btn_txt = if self.is_connected { "DISCONNECT" } else { "CONNECT" };
            if ui.button(btn_txt).clicked() {
                if !self.is_connected { self.send(GuiCommand::Connect(self.connection_mode)); }
                else { self.send(GuiCommand::Disconnect); }
            }
            if ui.button("📷 CAPTURE").clicked() { self.send(GuiCommand::Capture); }
            if ui.button("🔄 CLEAR").clicked() {
                self.send(GuiCommand::ClearBuffer);
                self.samples.clear();
            }

            ui.add_space(10.0);
            let (txt, col) = if self.export_ok { ("Export saved: YES", Color32::GREEN) } else { ("Export saved: NO", Color32::RED) };
            ui.label(egui::RichText::new(txt).strong().color(col));

            ui.add_space(10.0);
            egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                for m in &self.log_messages { ui.monospace(m); }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.is_connected { ui.label("Connect first."); }
            let points: Vec<[f64; 2]> = self.samples.iter().enumerate().map(|(i, v)| [i as f64, *v]).collect();
            Plot::new("live_plot")
                .include_y(0.0)
                .include_y(self.y_max)
                .auto_bounds_x()
                .allow_drag(false)
                .allow_zoom(false)
                .show(ui, |plot_ui| {
                    plot_ui.line(Line::new(PlotPoints::new(points)).color(Color32::from_rgb(0, 255, 255)));
                });
        });
    }
}

impl Drop for ScopeApp {
    fn drop(&mut self) {
        self.send(GuiCommand::Shutdown);
        if let Some(handle) = self.engine.take() {
            let _ = handle.join();
        }
    }
}
