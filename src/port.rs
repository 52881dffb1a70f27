//! Hardware seam
//!
//! The core never touches timer or ADC registers itself. Everything that ends
//! up in a peripheral goes through a [`HardwarePort`], which the firmware
//! implements on top of the STM32 timers and tests implement with a recorder.

use crate::pwm::{CompareValues, TriggerDelaySet};

/// Sink for compare values, trigger delays and the output mask
pub trait HardwarePort {
    /// Load the six PWM compare registers for the next carrier period
    ///
    /// All six values must take effect at the same carrier boundary.
    fn apply_edges(&mut self, compare: &CompareValues);

    /// Load the five ADC trigger delays for the next two carrier periods
    fn apply_delays(&mut self, delays: &TriggerDelaySet);

    /// Unmask (`true`) or mask (`false`) the gate driver outputs
    fn set_outputs_enabled(&mut self, enabled: bool);
}
