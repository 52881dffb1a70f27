// Sector-dependent PWM edge calculation for two-shunt current sensing
//
// Each call produces edges for a pair of carrier periods. The outputs are
// high for `duty` counts in each period, and the two pulses sit back to back
// around the carrier boundary, separated by a zero-vector pulse of width
// 2 * half-width. With a single DC-link shunt, current can only be sampled
// while exactly one or two legs are high, so the half-widths of the two
// non-idle legs are widened until the windows between neighbouring edges are
// long enough for the shunt current to settle and be converted.

use super::edges::{DutyVector, EdgeSet, ThreePhaseEdgeSet, TriggerDelaySet};
use super::sector::{DutyOrdering, Sector};
use crate::config::TimingConfig;
use crate::phase::{Phase, ThreePhase};

/// Zero-vector half-width per phase [counts]
pub type CenterPulseHalfWidths = ThreePhase<u16>;

/// Computes edge sets and ADC trigger delays from a duty vector and sector
pub struct SectorEdgeCalculator {
    timing: TimingConfig,
    duty_counts: ThreePhase<u16>,
    half_widths: CenterPulseHalfWidths,
    edges: ThreePhaseEdgeSet,
    delays: TriggerDelaySet,
}

impl SectorEdgeCalculator {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            timing,
            duty_counts: ThreePhase::splat(0),
            half_widths: ThreePhase::splat(timing.min_zero_pulse),
            edges: ThreePhase::splat(EdgeSet::around_boundary(
                timing.period,
                timing.min_zero_pulse,
                0,
            )),
            delays: TriggerDelaySet::static_default(timing.period),
        }
    }

    /// Compute the edges for the next two carrier periods
    ///
    /// `sector` is the raw sector number from the modulator. Anything outside
    /// 1..=6 yields symmetric minimum-width center pulses and the static
    /// trigger delays instead of an error.
    pub fn compute(&mut self, duty: &DutyVector, sector: u16) -> (ThreePhaseEdgeSet, TriggerDelaySet) {
        self.compute_counts(duty.to_counts(self.timing.period), sector)
    }

    /// Same as [`compute`](Self::compute) for duties already in carrier counts
    ///
    /// Counts above the period are clamped to it.
    pub fn compute_counts(
        &mut self,
        duty_counts: ThreePhase<u16>,
        sector: u16,
    ) -> (ThreePhaseEdgeSet, TriggerDelaySet) {
        let period = self.timing.period;
        self.duty_counts = duty_counts.map(|d| d.min(period));

        match Sector::try_from(sector) {
            Ok(sector) => {
                let ordering = sector.ordering();
                self.half_widths = self.half_widths_for(ordering);
                self.saturate_duty_counts();
                self.edges = self.edges_for_half_widths();
                self.delays = self.trigger_delays_for(ordering);
            }
            Err(invalid) => {
                warn!(
                    "Sector {} out of range, using minimum half-widths",
                    invalid.0
                );
                self.half_widths = ThreePhase::splat(self.timing.min_zero_pulse);
                self.saturate_duty_counts();
                self.edges = self.edges_for_half_widths();
                self.delays = TriggerDelaySet::static_default(period);
            }
        }

        (self.edges, self.delays)
    }

    /// Half-widths of the last computation
    pub fn half_widths(&self) -> CenterPulseHalfWidths {
        self.half_widths
    }

    /// Duty counts placed by the last computation, after saturation
    pub fn duty_counts(&self) -> ThreePhase<u16> {
        self.duty_counts
    }

    pub fn edges(&self) -> ThreePhaseEdgeSet {
        self.edges
    }

    pub fn delays(&self) -> TriggerDelaySet {
        self.delays
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Widen the center pulses of the middle and top legs so that both
    /// sampling windows are at least `min_sampling_pulse` long
    ///
    /// The gaps are unsigned differences; a duty vector that does not match
    /// the sector's ordering wraps to a huge gap and keeps the minimum width.
    fn half_widths_for(&self, ordering: DutyOrdering) -> CenterPulseHalfWidths {
        let t = &self.timing;
        let min_zero = t.min_zero_pulse as u32;
        let min_sampling = t.min_sampling_pulse as u32;
        let min_sum = t.min_sum_pulse as u32;

        let duty = |phase: Phase| self.duty_counts[phase] as u32;
        let gap_low = duty(ordering.mid).wrapping_sub(duty(ordering.idle));
        let gap_high = duty(ordering.top).wrapping_sub(duty(ordering.mid));

        let mid = if gap_low < min_sampling {
            min_sum - gap_low
        } else {
            min_zero
        };

        let window = mid + min_sampling;
        let top = if gap_high < window - min_zero {
            window - gap_high
        } else {
            min_zero
        };

        let mut widths = ThreePhase::splat(t.min_zero_pulse);
        widths[ordering.mid] = mid as u16;
        widths[ordering.top] = top as u16;
        widths
    }

    /// Limit each leg to the room left by its half-width
    ///
    /// Half-widths are chosen from the commanded duties first; a leg near full
    /// duty then loses the counts its widened zero-vector pulse occupies.
    fn saturate_duty_counts(&mut self) {
        let period = self.timing.period;
        for phase in Phase::ALL {
            let room = period.saturating_sub(self.half_widths[phase]);
            self.duty_counts[phase] = self.duty_counts[phase].min(room);
        }
    }

    fn edges_for_half_widths(&self) -> ThreePhaseEdgeSet {
        let period = self.timing.period;
        let mut edges = ThreePhaseEdgeSet::default();
        for phase in Phase::ALL {
            edges[phase] =
                EdgeSet::around_boundary(period, self.half_widths[phase], self.duty_counts[phase]);
        }
        edges
    }

    /// Place each trigger one acquisition time ahead of the edge that ends
    /// its sampling window; the bus-voltage trigger sits at the boundary
    fn trigger_delays_for(&self, ordering: DutyOrdering) -> TriggerDelaySet {
        let period = self.timing.period;
        let offset = self.timing.trigger_offset;
        let ahead = |edge: u16| edge.wrapping_sub(offset);

        let mut delays = [0u16; 5];
        delays[TriggerDelaySet::MID_EARLY] = ahead(self.edges[ordering.mid].edge1);
        delays[TriggerDelaySet::IDLE_EARLY] = ahead(self.edges[ordering.idle].edge1);
        delays[TriggerDelaySet::BUS_VOLTAGE] = period.wrapping_sub(offset >> 1);
        delays[TriggerDelaySet::MID_LATE] =
            ahead(period.wrapping_add(self.edges[ordering.mid].edge4));
        delays[TriggerDelaySet::TOP_LATE] =
            ahead(period.wrapping_add(self.edges[ordering.top].edge4));
        TriggerDelaySet(delays)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: u16 = 2000;

    fn calculator() -> SectorEdgeCalculator {
        SectorEdgeCalculator::new(TimingConfig::default())
    }

    /// Duty counts sorted as the sector requires: (top, mid, idle) -> (a, b, c)
    fn counts_for(sector: Sector, top: u16, mid: u16, idle: u16) -> ThreePhase<u16> {
        let o = sector.ordering();
        let mut counts = ThreePhase::splat(0);
        counts[o.top] = top;
        counts[o.mid] = mid;
        counts[o.idle] = idle;
        counts
    }

    #[test]
    fn test_worked_example_sector1_equal_duties() {
        let mut calc = calculator();
        let (edges, delays) = calc.compute(&DutyVector::centered(), 1);

        assert_eq!(calc.half_widths(), ThreePhase::new(320, 200, 80));
        assert_eq!(
            edges.a,
            EdgeSet {
                edge1: 680,
                edge2: 1680,
                edge3: 320,
                edge4: 1320
            }
        );
        assert_eq!(
            edges.b,
            EdgeSet {
                edge1: 800,
                edge2: 1800,
                edge3: 200,
                edge4: 1200
            }
        );
        assert_eq!(
            edges.c,
            EdgeSet {
                edge1: 920,
                edge2: 1920,
                edge3: 80,
                edge4: 1080
            }
        );
        assert_eq!(delays, TriggerDelaySet([760, 880, 1980, 3160, 3280]));
    }

    #[test]
    fn test_wide_gaps_keep_minimum_width() {
        let mut calc = calculator();
        let (_, delays) = calc.compute_counts(ThreePhase::new(1600, 1000, 400), 1);
        assert_eq!(calc.half_widths(), ThreePhase::splat(80));
        assert_eq!(delays.0[TriggerDelaySet::BUS_VOLTAGE], 1980);
    }

    #[test]
    fn test_small_gap_only_widens_what_is_needed() {
        let mut calc = calculator();
        // mid-idle gap is wide, top-mid gap is short
        calc.compute_counts(ThreePhase::new(1050, 1000, 400), 1);
        // mid stays minimal, top: window = 80 + 120 = 200, gap 50 < 120 -> 150
        assert_eq!(calc.half_widths(), ThreePhase::new(150, 80, 80));

        // mid-idle gap is short, top-mid gap is wide
        calc.compute_counts(ThreePhase::new(1600, 1000, 950), 1);
        // mid: 200 - 50 = 150, top: window = 270, gap 600 >= 190 -> minimum
        assert_eq!(calc.half_widths(), ThreePhase::new(80, 150, 80));
    }

    #[test]
    fn test_gap_exactly_at_threshold_is_not_widened() {
        let mut calc = calculator();
        calc.compute_counts(ThreePhase::new(1240, 1120, 1000), 1);
        assert_eq!(calc.half_widths(), ThreePhase::splat(80));
    }

    #[test]
    fn test_each_sector_permutes_the_same_result() {
        let (top, mid, idle) = (1100u16, 1050u16, 1000u16);
        let mut reference = calculator();
        reference.compute_counts(ThreePhase::new(top, mid, idle), 1);
        let widths_s1 = reference.half_widths();

        for sector in Sector::ALL {
            let mut calc = calculator();
            let counts = counts_for(sector, top, mid, idle);
            calc.compute_counts(counts, sector.number());

            let o = sector.ordering();
            let widths = calc.half_widths();
            assert_eq!(widths[o.top], widths_s1.a, "sector {}", sector.number());
            assert_eq!(widths[o.mid], widths_s1.b, "sector {}", sector.number());
            assert_eq!(widths[o.idle], widths_s1.c, "sector {}", sector.number());
        }
    }

    #[test]
    fn test_trigger_delays_follow_sector_legs() {
        for sector in Sector::ALL {
            let mut calc = calculator();
            let counts = counts_for(sector, 1500, 1000, 500);
            let (edges, delays) =
                calc.compute_counts(counts, sector.number());

            let o = sector.ordering();
            assert_eq!(delays.0[TriggerDelaySet::MID_EARLY], edges[o.mid].edge1 - 40);
            assert_eq!(delays.0[TriggerDelaySet::IDLE_EARLY], edges[o.idle].edge1 - 40);
            assert_eq!(delays.0[TriggerDelaySet::BUS_VOLTAGE], PERIOD - 20);
            assert_eq!(delays.0[TriggerDelaySet::MID_LATE], PERIOD + edges[o.mid].edge4 - 40);
            assert_eq!(delays.0[TriggerDelaySet::TOP_LATE], PERIOD + edges[o.top].edge4 - 40);
        }
    }

    #[test]
    fn test_edge_invariants_for_all_sectors() {
        let t = TimingConfig::default();
        // the widest possible half-width is min_sum + min_sampling; above this
        // duty a leg may saturate and its sampling window shrinks
        let unsaturated = PERIOD - (t.min_sum_pulse + t.min_sampling_pulse);

        for sector in Sector::ALL {
            for idle in (0..=PERIOD).step_by(97).chain([PERIOD]) {
                for mid in (idle..=PERIOD).step_by(61).chain([PERIOD]) {
                    for top in (mid..=PERIOD).step_by(89).chain([PERIOD]) {
                        let mut calc = calculator();
                        let counts = counts_for(sector, top, mid, idle);
                        let (edges, _) = calc.compute_counts(counts, sector.number());
                        let duty = calc.duty_counts();
                        let widths = calc.half_widths();
                        let o = sector.ordering();

                        for phase in Phase::ALL {
                            let e = edges[phase];
                            assert!(e.edge1 <= e.edge2 && e.edge2 <= PERIOD);
                            assert!(e.edge3 <= e.edge4 && e.edge4 <= PERIOD);
                            assert_eq!(e.edge2 - e.edge1, duty[phase]);
                            assert_eq!(e.edge4 - e.edge3, duty[phase]);
                            assert_eq!(e.edge3, PERIOD - e.edge2);
                            assert!(widths[phase] >= t.min_zero_pulse);
                            assert!(duty[phase] <= counts[phase]);
                        }
                        assert_eq!(widths[o.idle], t.min_zero_pulse);
                        if top > unsaturated {
                            continue;
                        }
                        assert_eq!(duty, counts);

                        // sampling windows: between the idle and mid rising edges, and
                        // between the mid and top rising edges
                        let gap_low = duty[o.mid] - duty[o.idle];
                        if gap_low < t.min_sampling_pulse {
                            let window = edges[o.idle].edge1 - edges[o.mid].edge1;
                            assert!(window >= t.min_sampling_pulse, "low window {}", window);
                        }
                        let gap_high = duty[o.top] - duty[o.mid];
                        if gap_high < t.min_sampling_pulse {
                            let window = edges[o.mid].edge1 - edges[o.top].edge1;
                            assert!(window >= t.min_sampling_pulse, "high window {}", window);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_high_duty_saturates_instead_of_wrapping() {
        let mut calc = calculator();
        let (edges, delays) = calc.compute_counts(ThreePhase::splat(1800), 1);
        assert_eq!(calc.half_widths(), ThreePhase::new(320, 200, 80));
        assert_eq!(calc.duty_counts(), ThreePhase::new(1680, 1800, 1800));
        assert_eq!(edges.a, EdgeSet { edge1: 0, edge2: 1680, edge3: 320, edge4: 2000 });
        assert_eq!(edges.b, EdgeSet { edge1: 0, edge2: 1800, edge3: 200, edge4: 2000 });
        assert_eq!(edges.c, EdgeSet { edge1: 120, edge2: 1920, edge3: 80, edge4: 1880 });
        assert_eq!(delays.0[TriggerDelaySet::TOP_LATE], 2 * PERIOD - 40);

        let (edges, _) = calc.compute(&DutyVector::new(1.0, 1.0, 1.0), 1);
        assert_eq!(edges.a, EdgeSet { edge1: 0, edge2: 1680, edge3: 320, edge4: 2000 });
        assert_eq!(edges.c, EdgeSet { edge1: 0, edge2: 1920, edge3: 80, edge4: 2000 });

        // a single leg at full duty, invalid sector included
        let (edges, _) = calc.compute(&DutyVector::new(1.0, 0.5, 0.0), 9);
        assert_eq!(edges.a, EdgeSet { edge1: 0, edge2: 1920, edge3: 80, edge4: 2000 });
    }

    #[test]
    fn test_around_boundary_saturates() {
        assert_eq!(
            EdgeSet::around_boundary(PERIOD, 320, 1900),
            EdgeSet { edge1: 0, edge2: 1680, edge3: 320, edge4: 2000 }
        );
        assert_eq!(
            EdgeSet::around_boundary(PERIOD, 2500, 10),
            EdgeSet { edge1: 0, edge2: 0, edge3: 2000, edge4: 2000 }
        );
    }

    #[test]
    fn test_compute_is_idempotent() {
        let duty = ThreePhase::new(1234, 1190, 1200);
        let mut calc = calculator();
        let first = calc.compute_counts(duty, 6);
        let second = calc.compute_counts(duty, 6);
        assert_eq!(first, second);

        let mut fresh = calculator();
        assert_eq!(fresh.compute_counts(duty, 6), first);
    }

    #[test]
    fn test_out_of_range_sector_falls_back() {
        for sector in [0u16, 7, 8, 255, u16::MAX] {
            let mut calc = calculator();
            let (edges, delays) = calc.compute_counts(ThreePhase::new(1400, 1000, 600), sector);
            assert_eq!(calc.half_widths(), ThreePhase::splat(80));
            assert_eq!(edges.a, EdgeSet::around_boundary(PERIOD, 80, 1400));
            assert_eq!(edges.b, EdgeSet::around_boundary(PERIOD, 80, 1000));
            assert_eq!(edges.c, EdgeSet::around_boundary(PERIOD, 80, 600));
            assert_eq!(delays, TriggerDelaySet([1400, 1600, 2000, 2400, 2600]));
        }
    }

    #[test]
    fn test_mismatched_ordering_keeps_minimum_widths() {
        // sector 1 expects A > B > C; C is largest here so both gaps wrap
        let mut calc = calculator();
        calc.compute_counts(ThreePhase::new(500, 700, 900), 1);
        assert_eq!(calc.half_widths(), ThreePhase::splat(80));
    }
}
