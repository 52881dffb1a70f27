// ADC trigger delay commit

use super::edges::TriggerDelaySet;
use crate::port::HardwarePort;

/// Pushes trigger delays to the hardware, one commit per staged edge set
///
/// The delay counter spans two carrier periods, so a committed set stays
/// valid for both halves of the edge set it was computed with.
#[derive(Debug, Default)]
pub struct TriggerScheduler {
    last: Option<TriggerDelaySet>,
    commits: u32,
}

impl TriggerScheduler {
    pub const fn new() -> Self {
        Self {
            last: None,
            commits: 0,
        }
    }

    pub fn commit<P: HardwarePort>(&mut self, port: &mut P, delays: &TriggerDelaySet) {
        port.apply_delays(delays);
        self.last = Some(*delays);
        self.commits = self.commits.wrapping_add(1);
    }

    /// Most recently committed delays
    pub fn last(&self) -> Option<TriggerDelaySet> {
        self.last
    }

    /// Number of commits so far (wraps)
    pub fn commit_count(&self) -> u32 {
        self.commits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::mock::{PortEvent, RecordingPort};

    #[test]
    fn test_commit_writes_once() {
        let mut port = RecordingPort::new();
        let mut scheduler = TriggerScheduler::new();
        assert_eq!(scheduler.last(), None);

        let delays = TriggerDelaySet([760, 880, 1980, 3160, 3280]);
        scheduler.commit(&mut port, &delays);

        assert_eq!(port.events, vec![PortEvent::Delays(delays)]);
        assert_eq!(scheduler.last(), Some(delays));
        assert_eq!(scheduler.commit_count(), 1);
    }
}
