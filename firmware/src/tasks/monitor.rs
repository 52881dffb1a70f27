//! 計測監視タスク
//!
//! 外付け温度センサーを読み取り、計測値としきい値フラグを定期的にログ出力します。
//! 保護動作（出力停止など）は外側の制御系の責務で、ここでは記録のみ行います。

use embassy_stm32::{
    adc::{Adc, AnyAdcChannel},
    peripherals,
};
use embassy_time::{Duration, Ticker};

use crate::config::adc::{FULL_SCALE, TEMP_OFFSET_V, TEMP_SLOPE, VREF};
use crate::state::{with_core, PHASE_CURRENTS};

/// ADC生値を温度[℃]に変換
fn temperature_from_raw(raw: u16) -> f32 {
    let volts = raw as f32 / FULL_SCALE * VREF;
    (volts - TEMP_OFFSET_V) / TEMP_SLOPE
}

/// 計測監視タスク（100ms周期）
#[embassy_executor::task]
pub async fn monitor_task(
    mut adc: Adc<'static, peripherals::ADC2>,
    mut temperature_pin: AnyAdcChannel<peripherals::ADC2>,
) {
    info!("Measurement monitor task started");

    let mut ticker = Ticker::every(Duration::from_millis(100));

    // デバッグログ用カウンタ（1秒ごとにログ）
    let mut log_counter = 0u32;
    let mut last_faults = None;

    loop {
        ticker.next().await;

        let raw = adc.blocking_read(&mut temperature_pin);
        let celsius = temperature_from_raw(raw);

        let Some((measurements, faults, calibrated)) = with_core(|core| {
            core.record_temperature(celsius);
            (*core.measurements(), core.faults(), core.is_calibrated())
        }) else {
            continue;
        };

        // フラグが変化したときだけ通知
        if last_faults != Some(faults) {
            if faults.any() {
                warn!("Threshold flags: {}", faults);
            } else if last_faults.is_some() {
                info!("Threshold flags cleared");
            }
            last_faults = Some(faults);
        }

        log_counter += 1;
        if log_counter >= 10 {
            log_counter = 0;
            info!(
                "[Meas] Vbus={}V, Ibus={}A, T={}C, calibrated={}",
                measurements.bus_voltage.filtered,
                measurements.bus_current.filtered,
                measurements.temperature.filtered,
                calibrated
            );
            if let Some(currents) = PHASE_CURRENTS.try_take() {
                info!(
                    "[Meas] Ia={}A, Ib={}A, Ic={}A",
                    currents.a, currents.b, currents.c
                );
            }
        }
    }
}
