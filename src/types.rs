// src/types.rs

// 连接模式
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum ConnectionMode {
    Simulation,
    Hardware,
}

// GUI 发给后台的命令
#[derive(Clone, Debug)]
pub enum GuiCommand {
    Connect(ConnectionMode),
    Disconnect,
    // 触发一次导出 (空格键)
    Capture,
    ClearBuffer,
    Shutdown,
}

// 后台发给 GUI 的消息
#[derive(Clone, Debug)]
pub enum EngineMessage {
    Log(String),
    Status(bool),          // 连接状态
    Samples(Vec<f64>),     // 绘图数据 (最近 N 个采样值)
    ExportStatus(bool),    // 上一次导出是否成功
}
