// Edge, duty and trigger-delay data types

use crate::phase::ThreePhase;

/// Commanded duty per phase, 0.0..=1.0
///
/// Each leg's pulse fits between its zero-vector half-width and the carrier
/// boundary, so the usable duty of a leg is `period - half_width` counts.
/// Higher duties saturate there when the edges are placed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyVector {
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl DutyVector {
    pub const fn new(a: f32, b: f32, c: f32) -> Self {
        Self { a, b, c }
    }

    /// 50 % on every leg (zero output voltage)
    pub const fn centered() -> Self {
        Self::new(0.5, 0.5, 0.5)
    }

    /// Scale to carrier counts
    ///
    /// Out-of-range fractions are clamped to 0.0..=1.0 and the product is
    /// truncated, not rounded.
    pub fn to_counts(&self, period: u16) -> ThreePhase<u16> {
        let scale = |duty: f32| (duty.clamp(0.0, 1.0) * period as f32) as u16;
        ThreePhase::new(scale(self.a), scale(self.b), scale(self.c))
    }
}

/// Which half of a two-period edge set drives the outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalfCycle {
    /// `edge1`/`edge2`: the pulse ends a half-width before the carrier boundary
    Early,
    /// `edge3`/`edge4`: the pulse starts a half-width after the carrier boundary
    Late,
}

impl HalfCycle {
    pub fn toggled(self) -> Self {
        match self {
            HalfCycle::Early => HalfCycle::Late,
            HalfCycle::Late => HalfCycle::Early,
        }
    }
}

/// Switching edges of one leg for two consecutive carrier periods [counts]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeSet {
    pub edge1: u16,
    pub edge2: u16,
    pub edge3: u16,
    pub edge4: u16,
}

impl EdgeSet {
    /// Place a `duty`-wide pulse on each side of a zero-vector pulse of
    /// half-width `half_width` centred on the carrier boundary
    ///
    /// `duty` saturates at `period - half_width`, so every edge stays within
    /// `0..=period`.
    pub fn around_boundary(period: u16, half_width: u16, duty: u16) -> Self {
        let half_width = half_width.min(period);
        let edge2 = period - half_width;
        let duty = duty.min(edge2);
        Self {
            edge1: edge2 - duty,
            edge2,
            edge3: half_width,
            edge4: half_width + duty,
        }
    }

    /// Compare values for one half of the set
    pub fn pair(&self, half: HalfCycle) -> (u16, u16) {
        match half {
            HalfCycle::Early => (self.edge1, self.edge2),
            HalfCycle::Late => (self.edge3, self.edge4),
        }
    }
}

/// Edge sets of all three legs
pub type ThreePhaseEdgeSet = ThreePhase<EdgeSet>;

/// Six compare-register values in channel order A1, A2, B1, B2, C1, C2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompareValues(pub [u16; 6]);

impl CompareValues {
    pub fn from_edges(edges: &ThreePhaseEdgeSet, half: HalfCycle) -> Self {
        let (a1, a2) = edges.a.pair(half);
        let (b1, b2) = edges.b.pair(half);
        let (c1, c2) = edges.c.pair(half);
        Self([a1, a2, b1, b2, c1, c2])
    }
}

/// Delays of the five ADC triggers within a two-period trigger counter [counts]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerDelaySet(pub [u16; 5]);

impl TriggerDelaySet {
    /// Just before the middle leg's early pulse
    pub const MID_EARLY: usize = 0;
    /// Just before the idle leg's early pulse
    pub const IDLE_EARLY: usize = 1;
    /// DC-bus voltage, at the carrier boundary
    pub const BUS_VOLTAGE: usize = 2;
    /// Just before the end of the middle leg's late pulse
    pub const MID_LATE: usize = 3;
    /// Just before the end of the top leg's late pulse
    pub const TOP_LATE: usize = 4;

    /// Sector-independent delays spread around the carrier boundary
    pub fn static_default(period: u16) -> Self {
        Self(crate::config::STATIC_TRIGGER_SPREAD.map(|spread| period.wrapping_add_signed(spread)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duty_to_counts_truncates_and_clamps() {
        let counts = DutyVector::new(0.5, 1.5, -0.2).to_counts(2000);
        assert_eq!(counts, ThreePhase::new(1000, 2000, 0));

        let counts = DutyVector::new(0.33333, 0.0, 1.0).to_counts(2000);
        assert_eq!(counts.a, 666);
    }

    #[test]
    fn test_edges_around_boundary() {
        let edges = EdgeSet::around_boundary(2000, 320, 1000);
        assert_eq!(
            edges,
            EdgeSet {
                edge1: 680,
                edge2: 1680,
                edge3: 320,
                edge4: 1320
            }
        );
        assert_eq!(edges.pair(HalfCycle::Early), (680, 1680));
        assert_eq!(edges.pair(HalfCycle::Late), (320, 1320));
    }

    #[test]
    fn test_compare_value_channel_order() {
        let edges = ThreePhase::new(
            EdgeSet::around_boundary(2000, 80, 100),
            EdgeSet::around_boundary(2000, 90, 200),
            EdgeSet::around_boundary(2000, 100, 300),
        );
        assert_eq!(
            CompareValues::from_edges(&edges, HalfCycle::Early),
            CompareValues([1820, 1920, 1710, 1910, 1600, 1900])
        );
        assert_eq!(
            CompareValues::from_edges(&edges, HalfCycle::Late),
            CompareValues([80, 180, 90, 290, 100, 400])
        );
    }

    #[test]
    fn test_static_default_delays() {
        assert_eq!(
            TriggerDelaySet::static_default(2000),
            TriggerDelaySet([1400, 1600, 2000, 2400, 2600])
        );
    }
}
