//! Current-sense offset calibration
//!
//! Runs while the gate outputs are masked, so the shunt amplifier output is
//! its DC bias. Every channel is fed through a recursive moving average; after
//! a fixed countdown the filtered values are frozen as offsets.

use super::filters::MovingAverage;
use crate::config::{MeasurementConfig, CALIBRATION_SETTLING_SHIFT};

/// Calibration state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationPhase {
    /// Nothing has happened since construction or the last reset
    NotStarted,
    /// Accumulators loaded with the nominal bias, countdown armed
    Initializing,
    /// Filtering samples
    Sampling,
    /// Offsets frozen
    Done,
}

/// Calibrated bias of each averaged current channel [A]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelOffsets {
    /// First averaged channel (raw slots 0 and 4)
    pub first: f32,
    /// Second averaged channel (raw slots 1 and 3)
    pub second: f32,
    /// DC-bus current reference used by reconstruction
    pub dc_bus: f32,
}

impl ChannelOffsets {
    pub fn nominal(config: &MeasurementConfig) -> Self {
        Self {
            first: config.phase_nominal_bias,
            second: config.phase_nominal_bias,
            dc_bus: config.bus_nominal_bias,
        }
    }
}

pub struct OffsetCalibrator {
    phase: CalibrationPhase,
    remaining: u32,
    exponent: u16,
    phase_bias: f32,
    bus_bias: f32,
    first: MovingAverage,
    second: MovingAverage,
    dc_bus: MovingAverage,
    offsets: ChannelOffsets,
}

impl OffsetCalibrator {
    pub fn new(config: &MeasurementConfig) -> Self {
        let exponent = config.calibration_exponent;
        Self {
            phase: CalibrationPhase::NotStarted,
            remaining: 0,
            exponent,
            phase_bias: config.phase_nominal_bias,
            bus_bias: config.bus_nominal_bias,
            first: MovingAverage::new(config.phase_nominal_bias, exponent),
            second: MovingAverage::new(config.phase_nominal_bias, exponent),
            dc_bus: MovingAverage::new(config.bus_nominal_bias, exponent),
            offsets: ChannelOffsets::nominal(config),
        }
    }

    /// Samples until `Done`: 2^(exponent + settling shift)
    pub fn sample_count(&self) -> u32 {
        1u32 << (self.exponent + CALIBRATION_SETTLING_SHIFT)
    }

    /// Arm the countdown and reload the accumulators with the nominal bias
    ///
    /// Also the only way back from `Done`.
    pub fn start(&mut self) {
        self.remaining = self.sample_count();
        self.first.reset(self.phase_bias);
        self.second.reset(self.phase_bias);
        self.dc_bus.reset(self.bus_bias);
        self.phase = CalibrationPhase::Initializing;
        info!(
            "Offset calibration started ({} samples)",
            self.remaining
        );
    }

    /// Back to `NotStarted` with nominal offsets
    pub fn reset(&mut self) {
        self.phase = CalibrationPhase::NotStarted;
        self.remaining = 0;
        self.offsets = ChannelOffsets {
            first: self.phase_bias,
            second: self.phase_bias,
            dc_bus: self.bus_bias,
        };
        self.first.reset(self.phase_bias);
        self.second.reset(self.phase_bias);
        self.dc_bus.reset(self.bus_bias);
    }

    /// Feed one pair of averaged channel readings [A]
    ///
    /// Starts the calibration on the first call. Returns `true` once the
    /// offsets are frozen; further calls leave them untouched.
    pub fn compute(&mut self, first: f32, second: f32) -> bool {
        if self.phase == CalibrationPhase::NotStarted {
            self.start();
        }
        if self.phase == CalibrationPhase::Initializing {
            self.phase = CalibrationPhase::Sampling;
        }
        if self.phase == CalibrationPhase::Sampling {
            self.offsets.first = self.first.update(first);
            self.offsets.second = self.second.update(second);
            // with the outputs masked the first channel carries the bus current bias
            self.offsets.dc_bus = self.dc_bus.update(first);

            self.remaining = self.remaining.saturating_sub(1);
            if self.remaining == 0 {
                self.offsets.dc_bus = self.dc_bus.update(first);
                self.phase = CalibrationPhase::Done;
                info!(
                    "Offset calibration done: first={}A second={}A dc_bus={}A",
                    self.offsets.first, self.offsets.second, self.offsets.dc_bus
                );
            }
        }
        self.phase == CalibrationPhase::Done
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == CalibrationPhase::Done
    }

    /// Samples left before `Done`
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn offsets(&self) -> ChannelOffsets {
        self.offsets
    }
}
