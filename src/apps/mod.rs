//! Application layer of the bridge firmware.
//!
//! The library's mode controller drives these through its `ModeHandler` and
//! `StatusDisplay` seams:
//! - [`bridge_app`]: per-mode bus work on the real peripherals
//! - [`status`]: status display sink

pub mod bridge_app;
pub mod status;

pub use bridge_app::{BridgeApp, BridgeHardware};
pub use status::StatusLog;
