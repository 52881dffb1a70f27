//! Configuration module
//!
//! Timing constants for the edge calculator and scaling/filter constants for
//! the measurement chain. Both structs are validated once, when the
//! [`ActuationCore`](crate::ActuationCore) is built; the real-time paths
//! assume a validated configuration and never re-check it.

pub mod params;

pub use params::*;

/// Rejected configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Carrier period is zero
    ZeroPeriod,
    /// Zero pulse plus sampling window does not fit into half a carrier period
    MinPulseTooWide,
    /// `min_sum_pulse` differs from `min_zero_pulse + min_sampling_pulse`
    MinSumMismatch,
    /// Trigger offset is at least the minimum sampling window
    TriggerOffsetTooLarge,
    /// Control tick must cover an even, non-zero number of carrier periods
    OddControlRatio,
    /// Calibration countdown would overflow
    CalibrationExponentTooLarge,
    /// A full-scale constant or filter coefficient is not strictly positive
    NonPositiveScale,
}

/// PWM edge and trigger timing
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// Carrier period [counts]
    pub period: u16,
    /// Minimum zero-vector half-width [counts]
    pub min_zero_pulse: u16,
    /// Minimum current sampling window [counts]
    pub min_sampling_pulse: u16,
    /// `min_zero_pulse + min_sampling_pulse` [counts]
    pub min_sum_pulse: u16,
    /// ADC acquisition time ahead of an edge [counts]
    pub trigger_offset: u16,
    /// Carrier periods between two control ticks
    pub periods_per_control_tick: u16,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            min_zero_pulse: DEFAULT_MIN_ZERO_PULSE,
            min_sampling_pulse: DEFAULT_MIN_SAMPLING_PULSE,
            min_sum_pulse: DEFAULT_MIN_SUM_PULSE,
            trigger_offset: DEFAULT_TRIGGER_OFFSET,
            periods_per_control_tick: DEFAULT_PERIODS_PER_CONTROL_TICK,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.min_zero_pulse as u32 + self.min_sampling_pulse as u32 > (self.period / 2) as u32 {
            return Err(ConfigError::MinPulseTooWide);
        }
        if self.min_sum_pulse as u32 != self.min_zero_pulse as u32 + self.min_sampling_pulse as u32
        {
            return Err(ConfigError::MinSumMismatch);
        }
        if self.trigger_offset >= self.min_sampling_pulse {
            return Err(ConfigError::TriggerOffsetTooLarge);
        }
        if self.periods_per_control_tick == 0 || self.periods_per_control_tick % 2 != 0 {
            return Err(ConfigError::OddControlRatio);
        }
        Ok(())
    }
}

/// Scaling, calibration and filter constants of the measurement chain
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeasurementConfig {
    /// DC-bus (shunt) current full scale [A]
    pub bus_current_max: f32,
    /// DC-bus voltage full scale [V]
    pub bus_voltage_max: f32,
    /// Expected amplifier bias of the phase channels before calibration [A]
    pub phase_nominal_bias: f32,
    /// Expected amplifier bias of the bus current channel before calibration [A]
    pub bus_nominal_bias: f32,
    /// Moving-average window is 2^exponent samples
    pub calibration_exponent: u16,
    /// Bus-voltage IIR numerator (current sample)
    pub voltage_b0: f32,
    /// Bus-voltage IIR numerator (previous sample)
    pub voltage_b1: f32,
    /// Bus-voltage IIR denominator (previous output)
    pub voltage_a1: f32,
    pub thresholds: FaultThresholds,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            bus_current_max: I_DCB_MAX,
            bus_voltage_max: U_DCB_MAX,
            phase_nominal_bias: I_MAX,
            bus_nominal_bias: I_DCB_MAX,
            calibration_exponent: DEFAULT_CALIBRATION_EXPONENT,
            voltage_b0: bus_voltage_filter::B0,
            voltage_b1: bus_voltage_filter::B1,
            voltage_a1: bus_voltage_filter::A1,
            thresholds: FaultThresholds::default(),
        }
    }
}

impl MeasurementConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // countdown is 2^(exponent + settling) and must fit in u32
        if self.calibration_exponent as u32 + CALIBRATION_SETTLING_SHIFT as u32 > 31 {
            return Err(ConfigError::CalibrationExponentTooLarge);
        }
        if !(self.bus_current_max > 0.0)
            || !(self.bus_voltage_max > 0.0)
            || !(self.voltage_b0 + self.voltage_b1 > 0.0)
        {
            return Err(ConfigError::NonPositiveScale);
        }
        Ok(())
    }

    /// Amperes per averaged current count
    pub fn current_scale(&self) -> f32 {
        self.bus_current_max / CURRENT_HALF_SCALE_COUNTS
    }

    /// Volts per bus-voltage count
    pub fn voltage_scale(&self) -> f32 {
        self.bus_voltage_max / ADC_FULL_SCALE_COUNTS
    }
}

/// Limits compared by [`MeasurementModule::faults`](crate::meas::MeasurementModule::faults)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultThresholds {
    pub bus_overvoltage: f32,
    pub bus_undervoltage: f32,
    pub bus_trip: f32,
    pub phase_overcurrent: f32,
    pub overtemperature: f32,
}

impl Default for FaultThresholds {
    fn default() -> Self {
        Self {
            bus_overvoltage: faults::U_DCB_OVER,
            bus_undervoltage: faults::U_DCB_UNDER,
            bus_trip: faults::U_DCB_TRIP,
            phase_overcurrent: faults::I_PH_OVER,
            overtemperature: faults::TEMP_OVER,
        }
    }
}
