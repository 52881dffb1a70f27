//! キャリア境界とサンプリング完了の割り込み
//!
//! - TIM1 update（最優先）: 二重バッファのエッジを適用し、制御ティックを通知
//! - ADC1 EOC/EOS: 5つの変換結果を集め、シーケンス完了でコアに渡す

use core::cell::Cell;

use embassy_stm32::pac;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use inverter_core::RawSamples;

use crate::state::{with_core, CONTROL_TICK, PHASE_CURRENTS};

struct SampleBuffer {
    samples: Cell<RawSamples>,
    index: Cell<usize>,
}

static SAMPLES: Mutex<CriticalSectionRawMutex, SampleBuffer> = Mutex::new(SampleBuffer {
    samples: Cell::new([0; 5]),
    index: Cell::new(0),
});

#[inline(always)]
unsafe fn period_boundary_irq_handler() {
    let tim1 = pac::TIM1;
    if !tim1.sr().read().uif() {
        return;
    }
    tim1.sr().modify(|w| w.set_uif(false));

    if with_core(|core| core.on_period_boundary()).unwrap_or(false) {
        CONTROL_TICK.signal(());
    }
}

#[inline(always)]
unsafe fn sampling_irq_handler() {
    let adc = pac::ADC1;
    let isr = adc.isr().read();

    if isr.eoc() {
        // DR読み出しでEOCはクリアされる
        let value = adc.dr().read().rdata();
        SAMPLES.lock(|buf| {
            let index = buf.index.get();
            if index < 5 {
                let mut samples = buf.samples.get();
                samples[index] = value;
                buf.samples.set(samples);
                buf.index.set(index + 1);
            }
        });
    }

    if isr.eos() {
        adc.isr().write(|w| w.set_eos(true));
        let samples = SAMPLES.lock(|buf| {
            let complete = buf.index.get() == 5;
            buf.index.set(0);
            complete.then(|| buf.samples.get())
        });

        // 取りこぼしたシーケンスは捨てる
        if let Some(raw) = samples {
            if let Some(Some(currents)) = with_core(|core| core.on_sampling_complete(raw)) {
                PHASE_CURRENTS.signal(currents);
            }
        }
    }

    if isr.ovr() {
        adc.isr().write(|w| w.set_ovr(true));
    }
}

/// TIM1 update割り込みのRust側エントリーポイント
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn TIM1_UP_TIM16() {
    period_boundary_irq_handler();
}

/// ADC1/ADC2割り込みのRust側エントリーポイント
#[allow(non_snake_case)]
#[no_mangle]
pub unsafe extern "C" fn ADC1_2() {
    sampling_irq_handler();
}
