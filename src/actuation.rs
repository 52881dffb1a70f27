//! Actuation core
//!
//! Single owner of the edge calculator, trigger scheduler, edge double buffer
//! and measurement module. The firmware drives it from three event sources:
//!
//! - control tick: [`ActuationCore::on_control_tick`] computes and stages the
//!   edges and trigger delays for the next pair of carrier periods
//! - carrier boundary: [`ActuationCore::on_period_boundary`] writes one half of
//!   the playing pair, takes over the staged set (and commits its delays) on
//!   each `Early` half, and reports when the next control tick is due
//! - sampling complete: [`ActuationCore::on_sampling_complete`] calibrates or
//!   reconstructs currents from the finished ADC sequence
//!
//! Each path only touches its own part of the state, so the owner can share
//! the core between interrupt priorities behind a short critical section.

use crate::config::{ConfigError, MeasurementConfig, TimingConfig};
use crate::meas::{FaultFlags, Measurement, MeasurementModule, MeasurementSet, RawSamples};
use crate::phase::ThreePhaseCurrent;
use crate::port::HardwarePort;
use crate::pwm::{
    DutyVector, EdgeDoubleBuffer, HalfCycle, SectorEdgeCalculator, TriggerDelaySet, TriggerScheduler,
};

/// Sector used with 50 % duty while the outputs are masked or being unmasked
const PARK_SECTOR: u16 = 2;

pub struct ActuationCore<P: HardwarePort> {
    port: P,
    timing: TimingConfig,
    calculator: SectorEdgeCalculator,
    trigger: TriggerScheduler,
    output: EdgeDoubleBuffer,
    meas: MeasurementModule,
    /// Sector of the staged edge set
    staged_sector: u16,
    /// Delays of the staged edge set, committed with its `Early` half
    staged_delays: Option<TriggerDelaySet>,
    /// Sector of the pair whose `Early` half was applied last
    pair_sector: u16,
    /// Sector of the last completed sampling window
    active_sector: u16,
    periods_since_tick: u16,
    outputs_enabled: bool,
}

impl<P: HardwarePort> ActuationCore<P> {
    pub fn new(
        port: P,
        timing: TimingConfig,
        measurement: MeasurementConfig,
    ) -> Result<Self, ConfigError> {
        if let Err(e) = timing.validate().and_then(|_| measurement.validate()) {
            error!("Configuration rejected: {}", e);
            return Err(e);
        }

        let mut calculator = SectorEdgeCalculator::new(timing);
        let (edges, _) = calculator.compute(&DutyVector::centered(), PARK_SECTOR);

        info!(
            "Actuation core ready: period={} control ratio={}",
            timing.period, timing.periods_per_control_tick
        );

        Ok(Self {
            port,
            timing,
            calculator,
            trigger: TriggerScheduler::new(),
            output: EdgeDoubleBuffer::new(edges),
            meas: MeasurementModule::new(measurement),
            staged_sector: PARK_SECTOR,
            staged_delays: None,
            pair_sector: PARK_SECTOR,
            active_sector: PARK_SECTOR,
            periods_since_tick: 0,
            outputs_enabled: false,
        })
    }

    /// Compute and stage the edges for the next pair of carrier periods
    ///
    /// Edges, trigger delays and sector are taken over together by the next
    /// `Early` boundary. A set staged between the two halves of a pair waits
    /// for the following pair.
    pub fn on_control_tick(&mut self, duty: &DutyVector, sector: u16) {
        let (edges, delays) = self.calculator.compute(duty, sector);
        self.output.stage(edges);
        self.staged_delays = Some(delays);
        self.staged_sector = sector;
    }

    /// Apply one half of the staged edges
    ///
    /// Returns `true` when a control tick is due. Ticks always fall on a
    /// boundary whose next half is `Early`, so a newly staged set starts at
    /// the beginning of its pair.
    pub fn on_period_boundary(&mut self) -> bool {
        // a sampling window closes inside the Late half of its pair
        match self.output.apply(&mut self.port) {
            HalfCycle::Early => {
                self.pair_sector = self.staged_sector;
                self.commit_staged_delays();
            }
            HalfCycle::Late => self.active_sector = self.pair_sector,
        }

        self.periods_since_tick += 1;
        if self.periods_since_tick >= self.timing.periods_per_control_tick {
            self.periods_since_tick = 0;
            true
        } else {
            false
        }
    }

    /// Process a finished ADC sequence
    ///
    /// Feeds the offset calibration until it is done, then returns the phase
    /// currents for the sector the samples were taken in. The bus voltage is
    /// updated either way.
    pub fn on_sampling_complete(&mut self, raw: RawSamples) -> Option<ThreePhaseCurrent> {
        self.meas.store_raw(raw);
        self.meas.update_bus_voltage();

        if !self.meas.calibrator().is_done() {
            self.meas.calibrate();
            return None;
        }

        let currents = self.meas.update_currents(self.active_sector);
        self.meas.update_bus_current();
        Some(currents)
    }

    /// Load 50 % duty and unmask the gate outputs
    pub fn enable_output(&mut self) {
        self.load_park_duty();
        self.port.set_outputs_enabled(true);
        self.outputs_enabled = true;
        info!("PWM outputs enabled");
    }

    /// Load 50 % duty and mask the gate outputs
    pub fn disable_output(&mut self) {
        self.load_park_duty();
        self.port.set_outputs_enabled(false);
        self.outputs_enabled = false;
        info!("PWM outputs disabled");
    }

    fn load_park_duty(&mut self) {
        self.on_control_tick(&DutyVector::centered(), PARK_SECTOR);
        // before a pair starts the delays can go out right away, which also
        // covers loading them before the timers run
        if self.output.next_half() == HalfCycle::Early {
            self.commit_staged_delays();
        }
        self.output.preload(&mut self.port);
    }

    fn commit_staged_delays(&mut self) {
        if let Some(delays) = self.staged_delays.take() {
            self.trigger.commit(&mut self.port, &delays);
        }
    }

    pub fn outputs_enabled(&self) -> bool {
        self.outputs_enabled
    }

    pub fn is_calibrated(&self) -> bool {
        self.meas.calibrator().is_done()
    }

    /// Drop all measurements and calibrate again from the next sample
    ///
    /// Only meaningful with the outputs masked.
    pub fn restart_calibration(&mut self) {
        self.meas.clear();
        self.meas.calibrator_mut().start();
    }

    pub fn record_temperature(&mut self, celsius: f32) -> Measurement {
        self.meas.record_temperature(celsius)
    }

    pub fn measurements(&self) -> &MeasurementSet {
        self.meas.measurements()
    }

    pub fn faults(&self) -> FaultFlags {
        self.meas.faults()
    }

    pub fn measurement(&self) -> &MeasurementModule {
        &self.meas
    }

    pub fn calculator(&self) -> &SectorEdgeCalculator {
        &self.calculator
    }

    pub fn trigger(&self) -> &TriggerScheduler {
        &self.trigger
    }

    pub fn output(&self) -> &EdgeDoubleBuffer {
        &self.output
    }

    /// Sector used to reconstruct the next finished sampling window
    pub fn active_sector(&self) -> u16 {
        self.active_sector
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}
