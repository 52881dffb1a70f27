// Space-vector sector and the phase orderings it implies

use crate::phase::Phase;

/// One of the six 60° regions of the space-vector plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sector {
    /// duty A > duty B > duty C
    S1,
    /// duty B > duty A > duty C
    S2,
    /// duty B > duty C > duty A
    S3,
    /// duty C > duty B > duty A
    S4,
    /// duty C > duty A > duty B
    S5,
    /// duty A > duty C > duty B
    S6,
}

/// Sector number outside 1..=6
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidSector(pub u16);

impl TryFrom<u16> for Sector {
    type Error = InvalidSector;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Sector::S1),
            2 => Ok(Sector::S2),
            3 => Ok(Sector::S3),
            4 => Ok(Sector::S4),
            5 => Ok(Sector::S5),
            6 => Ok(Sector::S6),
            other => Err(InvalidSector(other)),
        }
    }
}

/// Phases sorted by duty within a sector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyOrdering {
    /// Largest duty
    pub top: Phase,
    /// Middle duty
    pub mid: Phase,
    /// Smallest duty; its center pulse stays at the minimum width
    pub idle: Phase,
}

/// Shunt channel assignment for current reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensedPhases {
    /// Phase read from the first averaged channel (current flows out of the leg)
    pub first: Phase,
    /// Phase read from the second averaged channel (current flows into the leg)
    pub second: Phase,
    /// Phase derived from the zero-sum law
    pub derived: Phase,
}

impl Sector {
    pub const ALL: [Sector; 6] = [
        Sector::S1,
        Sector::S2,
        Sector::S3,
        Sector::S4,
        Sector::S5,
        Sector::S6,
    ];

    pub fn number(self) -> u16 {
        match self {
            Sector::S1 => 1,
            Sector::S2 => 2,
            Sector::S3 => 3,
            Sector::S4 => 4,
            Sector::S5 => 5,
            Sector::S6 => 6,
        }
    }

    pub fn ordering(self) -> DutyOrdering {
        use Phase::*;
        let (top, mid, idle) = match self {
            Sector::S1 => (A, B, C),
            Sector::S2 => (B, A, C),
            Sector::S3 => (B, C, A),
            Sector::S4 => (C, B, A),
            Sector::S5 => (C, A, B),
            Sector::S6 => (A, C, B),
        };
        DutyOrdering { top, mid, idle }
    }

    /// Which phases the two shunt samples see in this sector
    ///
    /// The shunt carries the top leg's current while only the top leg is high
    /// and the (negated) idle leg's current while only the idle leg is low,
    /// so the middle leg is always the derived one.
    pub fn sensed_phases(self) -> SensedPhases {
        let o = self.ordering();
        SensedPhases {
            first: o.top,
            second: o.idle,
            derived: o.mid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_round_trip_numbers() {
        for sector in Sector::ALL {
            assert_eq!(Sector::try_from(sector.number()), Ok(sector));
        }
        assert_eq!(Sector::try_from(0), Err(InvalidSector(0)));
        assert_eq!(Sector::try_from(7), Err(InvalidSector(7)));
    }

    #[test]
    fn test_orderings_are_permutations() {
        for sector in Sector::ALL {
            let o = sector.ordering();
            assert_ne!(o.top, o.mid);
            assert_ne!(o.mid, o.idle);
            assert_ne!(o.top, o.idle);

            let s = sector.sensed_phases();
            assert_ne!(s.first, s.second);
            assert_ne!(s.second, s.derived);
            assert_ne!(s.first, s.derived);
        }
    }

    #[test]
    fn test_sensed_phase_table() {
        use Phase::*;
        let expected = [(A, C, B), (B, C, A), (B, A, C), (C, A, B), (C, B, A), (A, B, C)];
        for (sector, (first, second, derived)) in Sector::ALL.into_iter().zip(expected) {
            assert_eq!(
                sector.sensed_phases(),
                SensedPhases {
                    first,
                    second,
                    derived
                }
            );
        }
    }
}
