//! Sector-aware PWM edge timing and shunt current sensing for a
//! three-phase inverter
//!
//! The crate turns a duty vector and space-vector sector into compare values
//! and ADC trigger delays, and turns the resulting ADC sequences back into
//! calibrated phase currents and DC-bus quantities. All register access goes
//! through [`HardwarePort`], so everything here runs on the host as well.
#![cfg_attr(not(test), no_std)]

mod fmt;

pub mod actuation;
pub mod config;
pub mod meas;
pub mod phase;
pub mod port;
pub mod pwm;

pub use actuation::ActuationCore;
pub use config::{ConfigError, FaultThresholds, MeasurementConfig, TimingConfig};
pub use meas::{FaultFlags, Measurement, MeasurementModule, MeasurementSet, RawSamples};
pub use phase::{Phase, ThreePhase, ThreePhaseCurrent};
pub use port::HardwarePort;
pub use pwm::{CompareValues, DutyVector, EdgeSet, Sector, ThreePhaseEdgeSet, TriggerDelaySet};
