//! STM32G4タイマー上のハードウェアポート実装
//!
//! - A相: TIM1 CH1/CH2（複合PWMモード、出力はOC1/OC1N）
//! - B相: TIM1 CH3/CH4（複合PWMモード、出力はOC3/OC3N）
//! - C相: TIM8 CH1/CH2（複合PWMモード、出力はOC1/OC1N）
//!
//! 各相の出力は CNT ∈ [CCRx, CCRx+1) の区間でハイになります。
//! CCRはプリロード有効なので、書き込みは次のupdateイベントで反映されます。

use embassy_stm32::pac;
use inverter_core::{CompareValues, HardwarePort, TriggerDelaySet};

use crate::adc_trigger;

/// TIM1/TIM8/TIM2を直接操作するポート
///
/// `hardware::init_pwm_pins` でタイマークロックを有効にした後に生成すること。
pub struct TimerPort {
    _private: (),
}

impl TimerPort {
    /// # Safety
    /// TIM1/TIM8のCCRとBDTRを他から触らないこと
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl HardwarePort for TimerPort {
    fn apply_edges(&mut self, compare: &CompareValues) {
        let [a1, a2, b1, b2, c1, c2] = compare.0;
        let tim1 = pac::TIM1;
        let tim8 = pac::TIM8;

        // UDISの間はシャドウレジスタへの転送が止まるので、6つのCCRが同じupdateで反映される
        tim1.cr1().modify(|w| w.set_udis(true));
        tim8.cr1().modify(|w| w.set_udis(true));

        tim1.ccr(0).write(|w| w.set_ccr(a1 as _));
        tim1.ccr(1).write(|w| w.set_ccr(a2 as _));
        tim1.ccr(2).write(|w| w.set_ccr(b1 as _));
        tim1.ccr(3).write(|w| w.set_ccr(b2 as _));
        tim8.ccr(0).write(|w| w.set_ccr(c1 as _));
        tim8.ccr(1).write(|w| w.set_ccr(c2 as _));

        tim8.cr1().modify(|w| w.set_udis(false));
        tim1.cr1().modify(|w| w.set_udis(false));
    }

    fn apply_delays(&mut self, delays: &TriggerDelaySet) {
        adc_trigger::load(delays);
    }

    fn set_outputs_enabled(&mut self, enabled: bool) {
        // MOE=0でOCx/OCxNはアイドル状態（ゲートオフ）
        pac::TIM1.bdtr().modify(|w| w.set_moe(enabled));
        pac::TIM8.bdtr().modify(|w| w.set_moe(enabled));
    }
}
