// Pending/playing edge buffer applied on carrier boundaries

use super::edges::{CompareValues, HalfCycle, ThreePhaseEdgeSet};
use crate::port::HardwarePort;

/// Edge sets for the running and the next pair of carrier periods
///
/// `stage` only touches the pending slot. The pending set is copied into the
/// playing slot when an `Early` half is applied, so a pair is always written
/// from one set even if a new one is staged between its two halves.
#[derive(Debug)]
pub struct EdgeDoubleBuffer {
    pending: ThreePhaseEdgeSet,
    playing: ThreePhaseEdgeSet,
    next: HalfCycle,
    period_count: u32,
}

impl EdgeDoubleBuffer {
    pub fn new(initial: ThreePhaseEdgeSet) -> Self {
        Self {
            pending: initial,
            playing: initial,
            next: HalfCycle::Early,
            period_count: 0,
        }
    }

    /// Replace the pending edges; the next `Early` apply picks them up
    pub fn stage(&mut self, edges: ThreePhaseEdgeSet) {
        self.pending = edges;
    }

    /// Write the next half to the hardware and toggle the slot
    ///
    /// Returns the half that was written.
    pub fn apply<P: HardwarePort>(&mut self, port: &mut P) -> HalfCycle {
        let half = self.next;
        if half == HalfCycle::Early {
            self.playing = self.pending;
        }
        port.apply_edges(&CompareValues::from_edges(&self.playing, half));
        self.next = half.toggled();
        self.period_count = self.period_count.wrapping_add(1);
        half
    }

    /// Write the half the next `apply` will use without advancing
    ///
    /// Used to load the registers before the outputs are unmasked.
    pub fn preload<P: HardwarePort>(&self, port: &mut P) {
        let source = match self.next {
            HalfCycle::Early => &self.pending,
            HalfCycle::Late => &self.playing,
        };
        port.apply_edges(&CompareValues::from_edges(source, self.next));
    }

    /// Half that the next `apply` writes
    pub fn next_half(&self) -> HalfCycle {
        self.next
    }

    pub fn staged(&self) -> &ThreePhaseEdgeSet {
        &self.pending
    }

    /// Set of the pair currently being written
    pub fn playing(&self) -> &ThreePhaseEdgeSet {
        &self.playing
    }

    /// Boundaries applied since start-up (wraps)
    pub fn period_count(&self) -> u32 {
        self.period_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::ThreePhase;
    use crate::port::mock::{PortEvent, RecordingPort};
    use crate::pwm::EdgeSet;

    fn edges(half_width: u16) -> ThreePhaseEdgeSet {
        ThreePhase::new(
            EdgeSet::around_boundary(2000, half_width, 1000),
            EdgeSet::around_boundary(2000, half_width, 800),
            EdgeSet::around_boundary(2000, half_width, 600),
        )
    }

    #[test]
    fn test_slots_alternate_starting_early() {
        let mut port = RecordingPort::new();
        let mut buffer = EdgeDoubleBuffer::new(edges(80));

        assert_eq!(buffer.apply(&mut port), HalfCycle::Early);
        assert_eq!(buffer.apply(&mut port), HalfCycle::Late);
        assert_eq!(buffer.apply(&mut port), HalfCycle::Early);
        assert_eq!(buffer.period_count(), 3);
        assert_eq!(buffer.next_half(), HalfCycle::Late);

        let written = port.edges();
        assert_eq!(written[0], CompareValues([920, 1920, 1120, 1920, 1320, 1920]));
        assert_eq!(written[1], CompareValues([80, 1080, 80, 880, 80, 680]));
        assert_eq!(written[2], written[0]);
    }

    #[test]
    fn test_one_register_write_per_boundary() {
        let mut port = RecordingPort::new();
        let mut buffer = EdgeDoubleBuffer::new(edges(80));
        for _ in 0..4 {
            buffer.apply(&mut port);
        }
        assert_eq!(port.events.len(), 4);
        assert!(port
            .events
            .iter()
            .all(|e| matches!(e, PortEvent::Edges(_))));
    }

    #[test]
    fn test_preload_does_not_advance() {
        let mut port = RecordingPort::new();
        let buffer = EdgeDoubleBuffer::new(edges(80));
        buffer.preload(&mut port);
        assert_eq!(buffer.next_half(), HalfCycle::Early);
        assert_eq!(buffer.period_count(), 0);
        assert_eq!(
            port.edges(),
            vec![CompareValues::from_edges(&edges(80), HalfCycle::Early)]
        );
    }

    #[test]
    fn test_staged_edges_take_effect_on_next_apply() {
        let mut port = RecordingPort::new();
        let mut buffer = EdgeDoubleBuffer::new(edges(80));
        buffer.apply(&mut port);
        buffer.apply(&mut port);

        buffer.stage(edges(200));
        assert_eq!(buffer.apply(&mut port), HalfCycle::Early);
        assert_eq!(
            port.edges()[2],
            CompareValues::from_edges(&edges(200), HalfCycle::Early)
        );
    }

    #[test]
    fn test_stage_between_halves_waits_for_next_pair() {
        let mut port = RecordingPort::new();
        let mut buffer = EdgeDoubleBuffer::new(edges(80));
        buffer.apply(&mut port);

        buffer.stage(edges(200));
        assert_eq!(buffer.apply(&mut port), HalfCycle::Late);
        assert_eq!(
            port.edges()[1],
            CompareValues::from_edges(&edges(80), HalfCycle::Late)
        );
        assert_eq!(buffer.playing(), &edges(80));

        assert_eq!(buffer.apply(&mut port), HalfCycle::Early);
        assert_eq!(buffer.apply(&mut port), HalfCycle::Late);
        assert_eq!(
            port.edges()[2..],
            [
                CompareValues::from_edges(&edges(200), HalfCycle::Early),
                CompareValues::from_edges(&edges(200), HalfCycle::Late),
            ]
        );
    }

    #[test]
    fn test_preload_mid_pair_keeps_playing_set() {
        let mut port = RecordingPort::new();
        let mut buffer = EdgeDoubleBuffer::new(edges(80));
        buffer.apply(&mut port);
        buffer.stage(edges(200));
        port.clear();

        buffer.preload(&mut port);
        assert_eq!(
            port.edges(),
            vec![CompareValues::from_edges(&edges(80), HalfCycle::Late)]
        );
    }
}
