mod acquisition;
mod generator;
mod measure;
mod trigger;

pub use acquisition::{AcquisitionLoop, ScopeEvent, ScopeState};
pub use generator::SignalGenerator;
pub use measure::{measure, Measurements};
pub use trigger::{align, find_edge};
