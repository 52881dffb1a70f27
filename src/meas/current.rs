// Phase current reconstruction from the DC-link shunt

use crate::phase::{ThreePhase, ThreePhaseCurrent};
use crate::pwm::Sector;

/// Five ADC results of one sampling sequence
///
/// Slots 0/4 and 1/3 are symmetric pairs of shunt samples around the carrier
/// boundary; slot 2 is the DC-bus voltage.
pub type RawSamples = [u16; 5];

/// Averaged shunt channels in amperes, before offset removal
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShuntChannels {
    pub first: f32,
    pub second: f32,
}

pub struct CurrentSampler {
    /// Amperes per averaged count
    scale: f32,
}

impl CurrentSampler {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }

    /// Average the symmetric sample pairs and scale them to amperes
    pub fn channels(&self, raw: &RawSamples) -> ShuntChannels {
        let avg = |a: u16, b: u16| ((a as u32 + b as u32) >> 1) as f32;
        ShuntChannels {
            first: avg(raw[0], raw[4]) * self.scale,
            second: avg(raw[1], raw[3]) * self.scale,
        }
    }

    /// Three phase currents [A] for the sector the samples were taken in
    ///
    /// The first channel sees the top leg's current flowing out of the bridge,
    /// the second the idle leg's current flowing in; the middle leg follows
    /// from the zero-sum law. An out-of-range sector yields zero currents.
    pub fn reconstruct(&self, raw: &RawSamples, sector: u16, bus_offset: f32) -> ThreePhaseCurrent {
        let Ok(sector) = Sector::try_from(sector) else {
            trace!("Sector {} out of range, currents zeroed", sector);
            return ThreePhase::splat(0.0);
        };

        let ch = self.channels(raw);
        let sensed = sector.sensed_phases();

        let i_first = ch.first - bus_offset;
        let i_second = bus_offset - ch.second;

        let mut currents = ThreePhase::splat(0.0);
        currents[sensed.first] = i_first;
        currents[sensed.second] = i_second;
        currents[sensed.derived] = -(i_first + i_second);
        currents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;

    const SCALE: f32 = 25.0 / 2048.0;

    fn sampler() -> CurrentSampler {
        CurrentSampler::new(SCALE)
    }

    #[test]
    fn test_channel_averaging_truncates() {
        let ch = sampler().channels(&[2049, 2048, 1000, 2048, 2048]);
        // (2049 + 2048) >> 1 = 2048
        assert_eq!(ch.first, 25.0);
        assert_eq!(ch.second, 25.0);
    }

    #[test]
    fn test_sector1_assignment() {
        // first = 2248 counts, second = 1948 counts, offset 25 A (2048 counts)
        let raw = [2248, 1948, 0, 1948, 2248];
        let i = sampler().reconstruct(&raw, 1, 25.0);
        let step = 200.0 * SCALE;
        let dip = 100.0 * SCALE;
        assert_eq!(i.a, (2248.0 * SCALE) - 25.0);
        assert_eq!(i.c, 25.0 - (1948.0 * SCALE));
        assert!((i.a - step).abs() < 1e-5);
        assert!((i.c - dip).abs() < 1e-5);
        assert_eq!(i.b, -(i.a + i.c));
    }

    #[test]
    fn test_zero_sum_exact_for_all_sectors() {
        let s = sampler();
        for sector in Sector::ALL {
            let sensed = sector.sensed_phases();
            for first in (0u16..4096).step_by(257) {
                for second in (0u16..4096).step_by(263) {
                    let raw = [first, second, 0, second, first];
                    let i = s.reconstruct(&raw, sector.number(), 24.7);
                    let measured = i[sensed.first] + i[sensed.second];
                    assert_eq!(i[sensed.derived], -measured);
                }
            }
        }
    }

    #[test]
    fn test_sensed_phase_follows_sector() {
        let s = sampler();
        let raw = [2448, 2048, 0, 2048, 2448];
        let expected_top = [Phase::A, Phase::B, Phase::B, Phase::C, Phase::C, Phase::A];
        for (sector, top) in Sector::ALL.into_iter().zip(expected_top) {
            let i = s.reconstruct(&raw, sector.number(), 25.0);
            let positive = Phase::ALL.into_iter().find(|p| i[*p] > 0.0);
            assert_eq!(positive, Some(top));
        }
    }

    #[test]
    fn test_invalid_sector_gives_zero() {
        let raw = [3000, 1000, 0, 1000, 3000];
        for sector in [0u16, 7, 100] {
            assert_eq!(
                sampler().reconstruct(&raw, sector, 25.0),
                ThreePhase::splat(0.0)
            );
        }
    }
}
