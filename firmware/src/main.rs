#![no_std]
#![no_main]

mod fmt;

mod adc_trigger;
mod config;
mod hardware;
mod port;
mod sampling;
mod state;
mod tasks;

#[cfg(not(feature = "defmt"))]
use panic_halt as _;
#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};

use embassy_executor::Spawner;
use embassy_stm32::adc::{Adc, AdcChannel, SampleTime};
use embassy_time::{Duration, Timer};
use inverter_core::ActuationCore;

use port::TimerPort;
use tasks::{control_task, monitor_task};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // ハードウェア初期化
    let config = hardware::create_clock_config();
    let p = embassy_stm32::init(config);

    info!("═══════════════════════════════════════════════════════════════════");
    info!("        3-Phase Inverter Core • STM32G431VB @ 170MHz");
    info!("        DC-link single shunt • center-pulse PWM");
    info!("═══════════════════════════════════════════════════════════════════");

    // シャントアンプとPWMピン
    hardware::init_shunt_amplifier(p.OPAMP1, p.PA1, p.PA2);
    let _pwm = hardware::init_pwm_pins(p.TIM1, p.PE9, p.PE8, p.PE13, p.PE12, p.TIM8, p.PC6, p.PA7);

    // アクチュエーションコア生成（設定が不正ならゲートを閉じたまま停止）
    let timing = config::timing();
    let measurement = config::measurement();
    info!(
        "Timing: period={}, zero={}, sampling={}, offset={}, ratio={}",
        timing.period,
        timing.min_zero_pulse,
        timing.min_sampling_pulse,
        timing.trigger_offset,
        timing.periods_per_control_tick
    );
    let mut core = match ActuationCore::new(unsafe { TimerPort::new() }, timing, measurement) {
        Ok(core) => core,
        Err(e) => {
            error!("Actuation core not started: {}", e);
            loop {
                Timer::after(Duration::from_secs(1)).await;
            }
        }
    };
    // 50%デューティと初期トリガー遅延をロード（出力はマスクのまま）
    core.disable_output();
    state::CORE.lock(|cell| *cell.borrow_mut() = Some(core));

    // タイマーとADCトリガー連携（ここから割り込みが動き出す）
    unsafe {
        hardware::init_sampling_adc();
        hardware::init_edge_timers();
    }

    spawner.spawn(control_task()).unwrap();

    // 温度監視タスク起動（PB2 = ADC2_IN12）
    let mut adc2 = Adc::new(p.ADC2);
    adc2.set_sample_time(SampleTime::CYCLES640_5);
    let temperature_pin = p.PB2.degrade_adc();
    spawner.spawn(monitor_task(adc2, temperature_pin)).unwrap();
    info!("Temperature monitoring started on PB2 (ADC2_IN12)");

    // オフセットキャリブレーション完了待ち（出力マスク中）
    info!("Waiting for current offset calibration...");
    while !state::with_core(|core| core.is_calibrated()).unwrap_or(false) {
        Timer::after(Duration::from_millis(10)).await;
    }
    state::with_core(|core| core.enable_output());
    info!("Gate outputs enabled");

    // メインループ（将来の拡張用）
    loop {
        Timer::after(Duration::from_millis(100)).await;
    }
}
