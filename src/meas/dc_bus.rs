//! DC-bus voltage and current

use super::filters::FirstOrderIir;
use super::Measurement;
use crate::config::MeasurementConfig;

/// Raw bits of a 12-bit conversion
const ADC_RESULT_MASK: u16 = 0x0FFF;

pub struct DcBusMonitor {
    /// Volts per count
    voltage_scale: f32,
    filter: FirstOrderIir,
    voltage: Measurement,
    current: Measurement,
}

impl DcBusMonitor {
    pub fn new(config: &MeasurementConfig) -> Self {
        Self {
            voltage_scale: config.voltage_scale(),
            filter: FirstOrderIir::new(config.voltage_b0, config.voltage_b1, config.voltage_a1),
            voltage: Measurement::ZERO,
            current: Measurement::ZERO,
        }
    }

    /// Scale a 12-bit bus voltage sample and low-pass it
    pub fn update_voltage(&mut self, raw: u16) -> Measurement {
        self.voltage.raw = (raw & ADC_RESULT_MASK) as f32 * self.voltage_scale;
        self.voltage.filtered = self.filter.update(self.voltage.raw);
        self.voltage
    }

    /// Bus current from the first averaged shunt channel [A]
    ///
    /// `filtered` is the channel minus its calibrated zero-current level.
    pub fn update_current(&mut self, first_channel: f32, dc_bus_offset: f32) -> Measurement {
        self.current.raw = first_channel;
        self.current.filtered = first_channel - dc_bus_offset;
        self.current
    }

    pub fn voltage(&self) -> Measurement {
        self.voltage
    }

    pub fn current(&self) -> Measurement {
        self.current
    }

    pub fn reset(&mut self) {
        self.filter.reset();
        self.voltage = Measurement::ZERO;
        self.current = Measurement::ZERO;
    }
}
