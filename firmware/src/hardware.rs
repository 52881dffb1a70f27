//! ハードウェア初期化モジュール
//!
//! ペリフェラルの初期化ロジックを集約します。
//! ピンとクロックはembassy-stm32で設定し、複合PWMモードやトリガー連携など
//! HALが扱わない部分はPACで直接設定します。

use embassy_stm32::{
    gpio::OutputType,
    opamp::{OpAmp, OpAmpGain, OpAmpSpeed},
    pac, peripherals,
    time::Hertz,
    timer::{
        complementary_pwm::{ComplementaryPwm, ComplementaryPwmPin},
        low_level::CountingMode,
        simple_pwm::PwmPin,
    },
    Config, Peri,
};

use crate::config;

/// RCCクロック設定を初期化
///
/// HSI → PLL（÷4 × 85 ÷ 2）で170MHz生成
pub fn create_clock_config() -> Config {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::mux::{Adcsel, ClockMux};
        use embassy_stm32::rcc::{Pll, PllMul, PllPreDiv, PllRDiv, PllSource, Sysclk};

        config.rcc.hsi = true;
        config.rcc.pll = Some(Pll {
            source: PllSource::HSI,
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL85,
            divp: None,
            divq: None,
            divr: Some(PllRDiv::DIV2),
        });
        config.rcc.sys = Sysclk::PLL1_R;

        let mut clock_mux = ClockMux::default();
        clock_mux.adc12sel = Adcsel::SYS;
        config.rcc.mux = clock_mux;
    }
    config
}

/// HALでPWMピンを割り当てたTIM1/TIM8
///
/// ドロップするとピン設定が戻るので、`main`で保持し続けること。
pub struct PwmTimers {
    pub tim1: ComplementaryPwm<'static, peripherals::TIM1>,
    pub tim8: ComplementaryPwm<'static, peripherals::TIM8>,
}

/// PWMピンとタイマークロックの設定
///
/// A相: PE9/PE8（TIM1 CH1/CH1N）、B相: PE13/PE12（TIM1 CH3/CH3N）、
/// C相: PC6/PA7（TIM8 CH1/CH1N）。CH2/CH4は参照用で出力しない。
#[allow(clippy::too_many_arguments)]
pub fn init_pwm_pins(
    tim1: Peri<'static, peripherals::TIM1>,
    pe9: Peri<'static, peripherals::PE9>,
    pe8: Peri<'static, peripherals::PE8>,
    pe13: Peri<'static, peripherals::PE13>,
    pe12: Peri<'static, peripherals::PE12>,
    tim8: Peri<'static, peripherals::TIM8>,
    pc6: Peri<'static, peripherals::PC6>,
    pa7: Peri<'static, peripherals::PA7>,
) -> PwmTimers {
    // 周波数はPACで上書きするので仮の値
    let freq = Hertz(40_000);

    let mut tim1 = ComplementaryPwm::new(
        tim1,
        Some(PwmPin::new(pe9, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(pe8, OutputType::PushPull)),
        None,
        None,
        Some(PwmPin::new(pe13, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(pe12, OutputType::PushPull)),
        None,
        None,
        freq,
        CountingMode::EdgeAlignedUp,
    );
    tim1.set_dead_time(config::pwm::DEAD_TIME as u16);

    let mut tim8 = ComplementaryPwm::new(
        tim8,
        Some(PwmPin::new(pc6, OutputType::PushPull)),
        Some(ComplementaryPwmPin::new(pa7, OutputType::PushPull)),
        None,
        None,
        None,
        None,
        None,
        None,
        freq,
        CountingMode::EdgeAlignedUp,
    );
    tim8.set_dead_time(config::pwm::DEAD_TIME as u16);

    PwmTimers { tim1, tim8 }
}

/// 複合PWMモードの設定（TIM1/TIM8共通）
///
/// OCx: PWMモード2（CNT >= CCRx でアクティブ）とOCx+1: PWMモード1
/// （CNT < CCRx+1 でアクティブ）のANDを出力する。
unsafe fn configure_combined_pwm(tim: pac::timer::TimAdv, channels: &[usize]) {
    use pac::timer::vals::Ocm;

    tim.cr1().modify(|w| w.set_cen(false));
    tim.psc().write_value(0);
    tim.arr()
        .write_value(pac::timer::regs::ArrCore((config::PWM_PERIOD - 1) as _));
    tim.cr1().modify(|w| w.set_arpe(true));

    for &ch in channels {
        let reference = ch + 1;
        tim.ccmr_output(ch / 2).modify(|w| {
            w.set_ocm(ch % 2, Ocm::COMBINED_PWM_MODE2);
            w.set_ocpe(ch % 2, true);
        });
        tim.ccmr_output(reference / 2).modify(|w| {
            w.set_ocm(reference % 2, Ocm::PWM_MODE1);
            w.set_ocpe(reference % 2, true);
        });
        tim.ccer().modify(|w| {
            w.set_cce(ch, true);
            w.set_ccne(ch, true);
        });
    }

    // MOEはポートが制御する。起動時はマスク
    tim.bdtr().modify(|w| {
        w.set_moe(false);
        w.set_ossi(true);
        w.set_ossr(true);
    });
}

/// PWMタイマーとトリガータイマーの設定と同期スタート
///
/// TIM1がマスター（CEN → TRGO）、TIM8とTIM2がスレーブ（トリガーモード）。
///
/// # Safety
/// PACを使用した直接レジスタ操作を含む
pub unsafe fn init_edge_timers() {
    info!("Initializing TIM1/TIM8 combined PWM...");
    let tim1 = pac::TIM1;
    let tim8 = pac::TIM8;

    configure_combined_pwm(tim1, &[0, 2]);
    configure_combined_pwm(tim8, &[0]);

    tim1.cr2()
        .modify(|w| w.set_mms(pac::timer::vals::Mms::ENABLE));
    tim8.smcr().modify(|w| {
        w.set_ts(pac::timer::vals::Ts::ITR0);
        w.set_sms(pac::timer::vals::Sms::TRIGGER_MODE);
    });

    crate::adc_trigger::init_trigger_timer();

    // UGではupdate割り込みを出さない
    tim1.cr1().modify(|w| w.set_urs(pac::timer::vals::Urs::COUNTER_ONLY));
    tim1.egr().write(|w| w.set_ug(true));
    tim8.egr().write(|w| w.set_ug(true));

    // キャリア境界割り込み
    tim1.sr().write(|w| w.0 = 0);
    tim1.dier().modify(|w| w.set_uie(true));

    cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM1_UP_TIM16);
    let mut cp = cortex_m::Peripherals::steal();
    cp.NVIC.set_priority(
        pac::Interrupt::TIM1_UP_TIM16,
        config::priority::PERIOD_BOUNDARY,
    );

    tim1.cr1().modify(|w| w.set_cen(true));
    info!(
        "Edge timers running: period={} counts",
        config::PWM_PERIOD
    );
}

/// シャントアンプ（OPAMP1 PGA ×4、出力PA2）
pub fn init_shunt_amplifier(
    opamp: Peri<'static, peripherals::OPAMP1>,
    pa1: Peri<'static, peripherals::PA1>,
    pa2: Peri<'static, peripherals::PA2>,
) {
    let mut op1 = OpAmp::new(opamp, OpAmpSpeed::HighSpeed);
    let output = op1.pga_ext(pa1, pa2, OpAmpGain::Mul4);
    // OPAMPはリセットまで動作させ続ける
    core::mem::forget(output);
    core::mem::forget(op1);
}

/// ADC1をTIM2 TRGOトリガーの5変換シーケンスに設定
///
/// 不連続モード（1トリガー1変換）、EOCごとに割り込み。
///
/// # Safety
/// PACを使用した直接レジスタ操作を含む
pub unsafe fn init_sampling_adc() {
    info!("Initializing ADC1 triggered sequence...");
    let rcc = pac::RCC;
    let adc = pac::ADC1;

    rcc.ahb2enr().modify(|w| w.set_adc12en(true));

    // レギュレータ起動とキャリブレーション
    adc.cr().modify(|w| w.set_deeppwd(false));
    adc.cr().modify(|w| w.set_advregen(true));
    cortex_m::asm::delay(170 * 20);
    adc.cr().modify(|w| w.set_adcal(true));
    while adc.cr().read().adcal() {}

    adc.cfgr().modify(|w| {
        w.set_discen(true);
        w.set_discnum(0);
        w.set_exten(pac::adc::vals::Exten::RISING_EDGE);
        w.set_extsel(11); // TIM2_TRGO
        w.set_ovrmod(pac::adc::vals::Ovrmod::OVERWRITE);
    });

    for (i, &channel) in config::adc::SEQUENCE.iter().enumerate() {
        adc.sqr1().modify(|w| w.set_sq(i, channel));
        adc.smpr(channel as usize / 10)
            .modify(|w| w.set_smp(channel as usize % 10, pac::adc::vals::SampleTime::CYCLES12_5));
    }
    adc.sqr1()
        .modify(|w| w.set_l(config::adc::SEQUENCE.len() as u8 - 1));

    adc.isr().write(|w| {
        w.set_adrdy(true);
        w.set_eoc(true);
        w.set_eos(true);
    });
    adc.cr().modify(|w| w.set_aden(true));
    while !adc.isr().read().adrdy() {}

    adc.ier().modify(|w| {
        w.set_eocie(true);
        w.set_eosie(true);
    });

    cortex_m::peripheral::NVIC::unmask(pac::Interrupt::ADC1_2);
    let mut cp = cortex_m::Peripherals::steal();
    cp.NVIC
        .set_priority(pac::Interrupt::ADC1_2, config::priority::SAMPLING);

    // トリガー待ちで変換開始
    adc.cr().modify(|w| w.set_adstart(true));
}
