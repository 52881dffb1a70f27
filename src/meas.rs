//! Measurement module
//!
//! Owns the last raw ADC sequence and turns it into calibrated electrical
//! quantities: offset calibration while the outputs are masked, then phase
//! currents, bus voltage and bus current on every sampling-complete event.

pub mod calibration;
pub mod current;
pub mod dc_bus;
pub mod filters;

pub use calibration::{CalibrationPhase, ChannelOffsets, OffsetCalibrator};
pub use current::{CurrentSampler, RawSamples, ShuntChannels};
pub use dc_bus::DcBusMonitor;
pub use filters::{FirstOrderIir, MovingAverage};

use crate::config::{FaultThresholds, MeasurementConfig, TEMPERATURE_FILTER_SHIFT};
use crate::phase::{Phase, ThreePhaseCurrent};

/// Raw sequence before the first conversion: current channels at mid-scale
pub const INITIAL_RAW_SAMPLES: RawSamples = [0x7FF, 0x7FF, 0, 0x7FF, 0x7FF];

/// One measured quantity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub raw: f32,
    pub filtered: f32,
}

impl Measurement {
    pub const ZERO: Self = Self {
        raw: 0.0,
        filtered: 0.0,
    };
}

/// Everything the outer control loop reads back
///
/// Phase currents carry the reconstructed value in both fields; the current
/// loop runs on unfiltered samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeasurementSet {
    pub phase_a: Measurement,
    pub phase_b: Measurement,
    pub phase_c: Measurement,
    pub bus_voltage: Measurement,
    pub bus_current: Measurement,
    pub temperature: Measurement,
}

impl MeasurementSet {
    pub fn phase_currents(&self) -> ThreePhaseCurrent {
        ThreePhaseCurrent::new(
            self.phase_a.filtered,
            self.phase_b.filtered,
            self.phase_c.filtered,
        )
    }
}

/// Threshold comparison results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FaultFlags {
    pub bus_overvoltage: bool,
    pub bus_undervoltage: bool,
    /// Bus voltage above the brake trip level
    pub bus_trip: bool,
    pub phase_overcurrent: bool,
    pub overtemperature: bool,
}

impl FaultFlags {
    pub fn any(&self) -> bool {
        self.bus_overvoltage
            || self.bus_undervoltage
            || self.bus_trip
            || self.phase_overcurrent
            || self.overtemperature
    }
}

pub struct MeasurementModule {
    config: MeasurementConfig,
    raw: RawSamples,
    calibrator: OffsetCalibrator,
    sampler: CurrentSampler,
    bus: DcBusMonitor,
    temperature: MovingAverage,
    measured: MeasurementSet,
    bus_voltage_faults: (bool, bool),
}

impl MeasurementModule {
    pub fn new(config: MeasurementConfig) -> Self {
        Self {
            raw: INITIAL_RAW_SAMPLES,
            calibrator: OffsetCalibrator::new(&config),
            sampler: CurrentSampler::new(config.current_scale()),
            bus: DcBusMonitor::new(&config),
            temperature: MovingAverage::new(0.0, TEMPERATURE_FILTER_SHIFT),
            measured: MeasurementSet::default(),
            bus_voltage_faults: (false, false),
            config,
        }
    }

    /// Zero every measurement and return the calibration to `NotStarted`
    ///
    /// The stored raw sequence is kept.
    pub fn clear(&mut self) {
        self.measured = MeasurementSet::default();
        self.calibrator.reset();
        self.bus.reset();
        self.temperature.reset(0.0);
        self.bus_voltage_faults = (false, false);
    }

    /// Latch the raw results of a finished sampling sequence
    pub fn store_raw(&mut self, raw: RawSamples) {
        self.raw = raw;
    }

    pub fn raw(&self) -> &RawSamples {
        &self.raw
    }

    /// One calibration step on the stored raw sequence
    ///
    /// Returns `true` once offsets are frozen.
    pub fn calibrate(&mut self) -> bool {
        let ch = self.sampler.channels(&self.raw);
        self.calibrator.compute(ch.first, ch.second)
    }

    /// Reconstruct the phase currents for the sector the samples were taken in
    pub fn update_currents(&mut self, sector: u16) -> ThreePhaseCurrent {
        let currents =
            self.sampler
                .reconstruct(&self.raw, sector, self.calibrator.offsets().dc_bus);
        for (phase, m) in [
            (Phase::A, &mut self.measured.phase_a),
            (Phase::B, &mut self.measured.phase_b),
            (Phase::C, &mut self.measured.phase_c),
        ] {
            m.raw = currents[phase];
            m.filtered = currents[phase];
        }
        currents
    }

    pub fn update_bus_voltage(&mut self) -> Measurement {
        let v = self.bus.update_voltage(self.raw[2]);
        self.measured.bus_voltage = v;

        let t = &self.config.thresholds;
        let state = (v.filtered > t.bus_overvoltage, v.filtered < t.bus_undervoltage);
        if state != self.bus_voltage_faults {
            if state.0 {
                warn!("DC-bus overvoltage: {}V", v.filtered);
            } else if state.1 {
                warn!("DC-bus undervoltage: {}V", v.filtered);
            } else {
                info!("DC-bus voltage back in range: {}V", v.filtered);
            }
            self.bus_voltage_faults = state;
        }
        v
    }

    pub fn update_bus_current(&mut self) -> Measurement {
        let ch = self.sampler.channels(&self.raw);
        let i = self
            .bus
            .update_current(ch.first, self.calibrator.offsets().dc_bus);
        self.measured.bus_current = i;
        i
    }

    /// Feed a power-stage temperature reading [°C]
    pub fn record_temperature(&mut self, celsius: f32) -> Measurement {
        self.measured.temperature = Measurement {
            raw: celsius,
            filtered: self.temperature.update(celsius),
        };
        self.measured.temperature
    }

    pub fn measurements(&self) -> &MeasurementSet {
        &self.measured
    }

    /// Compare the latest values against the configured limits
    pub fn faults(&self) -> FaultFlags {
        let t: &FaultThresholds = &self.config.thresholds;
        let m = &self.measured;
        let over = |i: f32| i > t.phase_overcurrent || i < -t.phase_overcurrent;
        FaultFlags {
            bus_overvoltage: m.bus_voltage.filtered > t.bus_overvoltage,
            bus_undervoltage: m.bus_voltage.filtered < t.bus_undervoltage,
            bus_trip: m.bus_voltage.filtered > t.bus_trip,
            phase_overcurrent: over(m.phase_a.filtered)
                || over(m.phase_b.filtered)
                || over(m.phase_c.filtered),
            overtemperature: m.temperature.filtered > t.overtemperature,
        }
    }

    pub fn calibrator(&self) -> &OffsetCalibrator {
        &self.calibrator
    }

    pub fn calibrator_mut(&mut self) -> &mut OffsetCalibrator {
        &mut self.calibrator
    }

    pub fn offsets(&self) -> ChannelOffsets {
        self.calibrator.offsets()
    }
}
