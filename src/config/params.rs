//! Default timing and measurement parameters
//!
//! Counts are timer ticks of the PWM carrier counter (80 counts = 1 µs at the
//! reference 80 MHz timer clock).

/// Carrier period [counts] (25 µs)
pub const DEFAULT_PERIOD: u16 = 2000;

/// Minimum half-width of the zero-vector pulse around the carrier boundary [counts] (1 µs)
pub const DEFAULT_MIN_ZERO_PULSE: u16 = 80;

/// Minimum time from a phase-voltage edge until the shunt current is stable enough to sample [counts]
pub const DEFAULT_MIN_SAMPLING_PULSE: u16 = 120;

/// `DEFAULT_MIN_ZERO_PULSE + DEFAULT_MIN_SAMPLING_PULSE`
pub const DEFAULT_MIN_SUM_PULSE: u16 = 200;

/// ADC acquisition time of one channel, used to place triggers ahead of an edge [counts] (0.5 µs)
pub const DEFAULT_TRIGGER_OFFSET: u16 = 40;

/// Carrier periods per control tick (150 µs control loop over 25 µs carrier periods)
pub const DEFAULT_PERIODS_PER_CONTROL_TICK: u16 = 6;

/// Trigger delays used when no valid sector is known
pub const STATIC_TRIGGER_SPREAD: [i16; 5] = [-600, -400, 0, 400, 600];

/// Phase current full scale [A]
pub const I_MAX: f32 = 31.25;

/// DC-bus current full scale [A]; the shunt amplifier sits at half scale for 0 A
pub const I_DCB_MAX: f32 = 25.0;

/// DC-bus voltage full scale [V]
pub const U_DCB_MAX: f32 = 45.0;

/// Raw counts corresponding to `I_DCB_MAX`
pub const CURRENT_HALF_SCALE_COUNTS: f32 = 2048.0;

/// Full scale of the 12-bit converter
pub const ADC_FULL_SCALE_COUNTS: f32 = 4095.0;

/// Offset calibration: 2^exponent samples per filter window
pub const DEFAULT_CALIBRATION_EXPONENT: u16 = 4;

/// Extra doublings of the calibration countdown so the moving average settles
pub const CALIBRATION_SETTLING_SHIFT: u16 = 4;

/// Temperature moving average: 2^shift samples
pub const TEMPERATURE_FILTER_SHIFT: u16 = 3;

/// DC-bus voltage first-order IIR (100 Hz cut-off at 150 µs sampling)
pub mod bus_voltage_filter {
    pub const B0: f32 = 0.045_003_165;
    pub const B1: f32 = 0.045_003_165;
    pub const A1: f32 = -0.909_993_67;
}

/// Fault thresholds, compared but never acted upon by this crate
pub mod faults {
    /// DC-bus voltage trip level [V]
    pub const U_DCB_TRIP: f32 = 17.0;
    /// DC-bus undervoltage [V]
    pub const U_DCB_UNDER: f32 = 8.0;
    /// DC-bus overvoltage [V]
    pub const U_DCB_OVER: f32 = 18.0;
    /// Phase overcurrent [A]
    pub const I_PH_OVER: f32 = 5.0;
    /// Power stage overtemperature [°C]
    pub const TEMP_OVER: f32 = 110.0;
}
