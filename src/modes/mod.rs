//! Mode selection: which host link is bridged to which downstream bus.

pub mod lifecycle;
pub mod registry;

pub use lifecycle::{status_parameter, ModeController, ModeHandler, ModeState, StatusDisplay};
pub use registry::{AxisCursor, Bus, Mode, ModeAxis};
