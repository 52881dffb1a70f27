//! 制御ティックタスク
//!
//! TIM1 update割り込みからの通知を受け、最新のデューティ指令から
//! 次の2キャリア周期分のエッジとADCトリガー遅延を計算してステージします。

use crate::state::{with_core, CONTROL_TICK, DUTY_COMMAND};

/// 制御ティックタスク（PERIODS_PER_CONTROL_TICK周期ごと）
#[embassy_executor::task]
pub async fn control_task() {
    info!("Control tick task started");

    loop {
        CONTROL_TICK.wait().await;

        let (duty, sector) = DUTY_COMMAND.lock(|cmd| *cmd.borrow());
        if with_core(|core| core.on_control_tick(&duty, sector)).is_none() {
            warn!("Control tick before core initialization");
        }
    }
}
