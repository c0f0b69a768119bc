//! ADXL345 3-axis accelerometer on the SPI bridge.
//!
//! This module provides:
//! - Register map and SPI command encoding ([`registers`])
//! - Register-level driver over any [`RegisterBus`] ([`driver`])
//! - Static calibration and dynamic-acceleration pipeline ([`pipeline`])

pub mod driver;
pub mod pipeline;
pub mod registers;

pub use driver::{Adxl345, Error, RawSample, RegisterBus};
pub use pipeline::{
    report_interval_ms, AccelPipeline, CalibrationOffset, DeviceStatus, DynamicSample, Pacer, SetupReport,
};
