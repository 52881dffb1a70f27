//! Configuration module
//!
//! ボード固有のパラメータから、コアライブラリのタイミング設定と
//! 計測設定を組み立てます。

pub mod params;

pub use params::*;

use inverter_core::{MeasurementConfig, TimingConfig};

/// 170MHzタイマー用のPWMタイミング設定
pub fn timing() -> TimingConfig {
    TimingConfig {
        period: PWM_PERIOD,
        min_zero_pulse: MIN_ZERO_PULSE,
        min_sampling_pulse: MIN_SAMPLING_PULSE,
        min_sum_pulse: MIN_ZERO_PULSE + MIN_SAMPLING_PULSE,
        trigger_offset: TRIGGER_OFFSET,
        periods_per_control_tick: PERIODS_PER_CONTROL_TICK,
    }
}

/// 計測設定（スケール・フィルタ・しきい値はライブラリのデフォルト）
pub fn measurement() -> MeasurementConfig {
    MeasurementConfig {
        calibration_exponent: CALIBRATION_EXPONENT,
        ..MeasurementConfig::default()
    }
}
