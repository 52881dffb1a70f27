//! ボード固有のパラメータ
//!
//! タイマーカウントは170MHzのタイマークロック基準（170カウント = 1µs）

/// PWMキャリア周期 [カウント]（25µs = 40kHz）
pub const PWM_PERIOD: u16 = 4250;

/// ゼロベクトルパルスの最小半幅 [カウント]（1µs）
pub const MIN_ZERO_PULSE: u16 = 170;

/// シャント電流の安定待ち時間 [カウント]（1.5µs）
pub const MIN_SAMPLING_PULSE: u16 = 255;

/// ADCトリガーをエッジより前倒しする時間 [カウント]（0.5µs）
pub const TRIGGER_OFFSET: u16 = 85;

/// 制御周期あたりのキャリア周期数（150µs）
pub const PERIODS_PER_CONTROL_TICK: u16 = 6;

/// オフセットキャリブレーションの移動平均窓（2^n サンプル）
pub const CALIBRATION_EXPONENT: u16 = 6;

/// PWM設定
pub mod pwm {
    /// デッドタイム [DTGカウント]（約200ns）
    pub const DEAD_TIME: u8 = 34;
}

/// ADCチャネル割り当て
pub mod adc {
    /// OPAMP1 PGA出力（PA2 = ADC1_IN3）: DCリンクシャント電流
    pub const SHUNT_CHANNEL: u8 = 3;

    /// PC1 = ADC12_IN7: DCバス電圧
    pub const BUS_VOLTAGE_CHANNEL: u8 = 7;

    /// 変換シーケンス（サンプリングトリガー順）
    pub const SEQUENCE: [u8; 5] = [
        SHUNT_CHANNEL,
        SHUNT_CHANNEL,
        BUS_VOLTAGE_CHANNEL,
        SHUNT_CHANNEL,
        SHUNT_CHANNEL,
    ];

    /// 外付け温度センサー（PB2 = ADC2_IN12、MCP9700相当）: 0℃での電圧 [V]
    pub const TEMP_OFFSET_V: f32 = 0.5;

    /// 外付け温度センサー: 傾き [V/℃]
    pub const TEMP_SLOPE: f32 = 0.01;

    /// ADCフルスケール
    pub const FULL_SCALE: f32 = 4096.0;

    /// ADC基準電圧 [V]
    pub const VREF: f32 = 3.3;
}

/// NVIC優先度（上位4ビット、小さいほど高優先）
pub mod priority {
    /// キャリア境界（TIM1 update）
    pub const PERIOD_BOUNDARY: u8 = 0x00;

    /// ADCトリガーシーケンサ（TIM2）
    pub const TRIGGER: u8 = 0x10;

    /// サンプリング完了（ADC1）
    pub const SAMPLING: u8 = 0x20;
}
