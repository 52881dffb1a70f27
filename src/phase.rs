// Three-phase value containers
//
// Every per-phase quantity in the crate (duty counts, pulse half-widths,
// edge sets, currents) is stored in a `ThreePhase<T>` indexed by `Phase`, so
// sector-dependent code can address phases through a permutation instead of
// spelling out each case.

use core::ops::{Index, IndexMut};

/// Inverter leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    A,
    B,
    C,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::A, Phase::B, Phase::C];
}

/// One value per phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ThreePhase<T> {
    pub a: T,
    pub b: T,
    pub c: T,
}

impl<T> ThreePhase<T> {
    pub const fn new(a: T, b: T, c: T) -> Self {
        Self { a, b, c }
    }

    /// Apply `f` to every phase
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> ThreePhase<U> {
        ThreePhase {
            a: f(self.a),
            b: f(self.b),
            c: f(self.c),
        }
    }
}

impl<T: Copy> ThreePhase<T> {
    pub const fn splat(value: T) -> Self {
        Self {
            a: value,
            b: value,
            c: value,
        }
    }
}

impl<T> Index<Phase> for ThreePhase<T> {
    type Output = T;

    fn index(&self, phase: Phase) -> &T {
        match phase {
            Phase::A => &self.a,
            Phase::B => &self.b,
            Phase::C => &self.c,
        }
    }
}

impl<T> IndexMut<Phase> for ThreePhase<T> {
    fn index_mut(&mut self, phase: Phase) -> &mut T {
        match phase {
            Phase::A => &mut self.a,
            Phase::B => &mut self.b,
            Phase::C => &mut self.c,
        }
    }
}

/// Phase currents [A]
pub type ThreePhaseCurrent = ThreePhase<f32>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_by_phase() {
        let mut v = ThreePhase::new(1u16, 2, 3);
        assert_eq!(v[Phase::A], 1);
        assert_eq!(v[Phase::B], 2);
        assert_eq!(v[Phase::C], 3);

        v[Phase::B] = 20;
        assert_eq!(v.b, 20);
    }

    #[test]
    fn test_map() {
        let v = ThreePhase::new(1u16, 2, 3).map(|x| x as f32 * 0.5);
        assert_eq!(v, ThreePhase::new(0.5, 1.0, 1.5));
    }
}
