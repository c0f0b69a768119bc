//! Hardware-independent core of the multibridge firmware.
//!
//! The firmware binary (`src/main.rs`, built with the `firmware` feature) wires
//! these pieces to the STM32H753 peripherals. Everything in this library only
//! depends on `embedded-hal` traits, so it builds and unit-tests on the host:
//!
//! - [`input`]: debounced button channels shared between the edge tasks and the main loop
//! - [`modes`]: mode registry and the mode lifecycle state machine
//! - [`drivers`]: ADXL345 acquisition pipeline, DS18B20 over 1-Wire, BH1750 light sensor
//! - [`report`]: text lines sent back over the host links
//! - [`config`]: compile-time bridge configuration

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod config;
pub mod drivers;
pub mod input;
pub mod modes;
pub mod report;

#[cfg(feature = "defmt")]
#[doc(hidden)]
pub use defmt;

pub use config::BridgeConfig;
pub use input::ButtonChannel;
pub use modes::{Bus, Mode, ModeAxis, ModeController, ModeHandler, ModeState, StatusDisplay};
