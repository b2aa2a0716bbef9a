// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod config;
mod drivers;
mod engine;
mod gui;
mod types;
use std::path::PathBuf;
use config::{ScopeConfig, DEFAULT_CONFIG_FILE};
use eframe::egui;
// 入口函数
fn main() -> anyhow::Result<()> {
    env_logger::init();
    // 配置文件: 第一个命令行参数, 否则使用工作目录下的默认文件
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = ScopeConfig::load(&config_path)?;
    log::info!(
        "port {} @ {} baud, {} samples of history, captures go to {}",
        config.serial_port,
        config.baud_rate,
        config.buffer_capacity,
        config.output_folder.display()
    );
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1200.0, 760.0])
        .with_min_inner_size([800.0, 500.0])
        .with_title("Serial Scope");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Serial Scope",
        options,
        Box::new(move |_cc| Box::new(gui::ScopeApp::new(config))),
    )
    .map_err(|err| anyhow::anyhow!("window failed: {err}"))
}
