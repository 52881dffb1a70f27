//! ADCトリガーシーケンサ（TIM2）
//!
//! TIM2はキャリア2周期分（ARR = 2 * PWM_PERIOD - 1）を数え、CC1の一致で
//! TRGO（compare pulse）を出してADC1の変換を1つずつ起動します。
//! CC1割り込みでCCR1を次の遅延値に進め、5つの遅延を順番に消化します。
//!
//! 遅延セットは `load` で予約され、次の2周期ウィンドウの先頭（TIM2 update）で
//! まとめて有効になります。ウィンドウの途中で遅延が混ざることはありません。

use core::cell::{Cell, RefCell};

use embassy_stm32::pac;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use inverter_core::TriggerDelaySet;

use crate::config;

struct Sequencer {
    /// 次のウィンドウで使う遅延
    pending: Cell<Option<TriggerDelaySet>>,
    /// 現在のウィンドウの遅延
    active: RefCell<TriggerDelaySet>,
    /// 次に発火するトリガーの番号
    next: Cell<usize>,
}

static SEQUENCER: Mutex<CriticalSectionRawMutex, Sequencer> = Mutex::new(Sequencer {
    pending: Cell::new(None),
    active: RefCell::new(TriggerDelaySet([0; 5])),
    next: Cell::new(0),
});

/// 遅延セットを予約（次のウィンドウ先頭で反映）
pub fn load(delays: &TriggerDelaySet) {
    SEQUENCER.lock(|s| s.pending.set(Some(*delays)));
}

/// TIM2初期化
///
/// # Safety
/// PACを使用した直接レジスタ操作を含む
pub unsafe fn init_trigger_timer() {
    let rcc = pac::RCC;
    let tim2 = pac::TIM2;

    rcc.apb1enr1().modify(|w| w.set_tim2en(true));

    tim2.cr1().modify(|w| w.set_cen(false));
    tim2.psc().write_value(0);
    tim2.arr()
        .write_value(pac::timer::regs::Arr32(2 * config::PWM_PERIOD as u32 - 1));

    // CC1: 一致でTRGOパルス（ADC1 EXTSEL = TIM2_TRGO）
    tim2.ccmr_output(0).modify(|w| {
        w.set_ocm(0, pac::timer::vals::Ocm::FROZEN);
        w.set_ocpe(0, false);
    });
    tim2.cr2()
        .modify(|w| w.set_mms(pac::timer::vals::Mms::COMPARE_PULSE));

    // TIM1のカウンタ有効化（ITR0）で同時スタート
    tim2.smcr().modify(|w| {
        w.set_ts(pac::timer::vals::Ts::ITR0);
        w.set_sms(pac::timer::vals::Sms::TRIGGER_MODE);
    });

    tim2.dier().modify(|w| {
        w.set_uie(true);
        w.set_ccie(0, true);
    });

    tim2.sr().write(|w| w.0 = 0);
    tim2.egr().write(|w| w.set_ug(true));

    cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM2);
    let mut cp = cortex_m::Peripherals::steal();
    cp.NVIC
        .set_priority(pac::Interrupt::TIM2, config::priority::TRIGGER);
}

#[inline(always)]
unsafe fn tim2_irq_handler() {
    let tim2 = pac::TIM2;
    let sr = tim2.sr().read();

    // ウィンドウ先頭：予約済みの遅延を有効化
    if sr.uif() {
        tim2.sr().modify(|w| w.set_uif(false));
        let first = SEQUENCER.lock(|s| {
            if let Some(delays) = s.pending.take() {
                *s.active.borrow_mut() = delays;
            }
            s.next.set(1);
            s.active.borrow().0[0]
        });
        tim2.ccr(0)
            .write_value(pac::timer::regs::Ccr32(first as u32));
    }

    // トリガー発火：次の遅延へ
    if sr.ccif(0) {
        tim2.sr().modify(|w| w.set_ccif(0, false));
        let next = SEQUENCER.lock(|s| {
            let index = s.next.get();
            if index < 5 {
                s.next.set(index + 1);
                Some(s.active.borrow().0[index])
            } else {
                None
            }
        });
        if let Some(delay) = next {
            tim2.ccr(0)
                .write_value(pac::timer::regs::Ccr32(delay as u32));
        }
    }
}

/// TIM2割り込みのRust側エントリーポイント
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn TIM2() {
    tim2_irq_handler();
}
