// PWM edge generation
// Sector-aware edge placement, ADC trigger delays and double-buffered register output

pub mod double_buffer;
pub mod edge_calculator;
pub mod edges;
pub mod sector;
pub mod trigger;

pub use double_buffer::EdgeDoubleBuffer;
pub use edge_calculator::{CenterPulseHalfWidths, SectorEdgeCalculator};
pub use edges::{CompareValues, DutyVector, EdgeSet, HalfCycle, ThreePhaseEdgeSet, TriggerDelaySet};
pub use sector::{DutyOrdering, InvalidSector, Sector, SensedPhases};
pub use trigger::TriggerScheduler;
