//! DS18B20 temperature sensor on a bit-banged 1-Wire bus.

pub mod driver;
pub mod onewire;

pub use driver::{decode_scratchpad, Ds18b20, CONVERSION_TIME_MS};
pub use onewire::{crc8, OneWireBus, OpenDrainLine};
