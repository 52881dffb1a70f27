//! タスクモジュール
//!
//! 各タスクの実装を分離して管理します。

pub mod control;
pub mod monitor;

// タスク関数を再エクスポート
pub use control::control_task;
pub use monitor::monitor_task;
