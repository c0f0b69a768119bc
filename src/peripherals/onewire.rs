//! 1-Wire data line on PD0.

use embassy_stm32::{
    gpio::{Level, OutputOpenDrain, Speed},
    peripherals::PD0,
    Peri,
};
use multibridge::drivers::ds18b20::OpenDrainLine;

/// Peripheral collection for the 1-Wire line
pub struct OneWirePeripherals<'d> {
    pub data: Peri<'d, PD0>, // DQ, 4.7k pull-up to 3V3 on the board
}

/// Macro to claim peripherals for OneWireLine
#[macro_export]
macro_rules! claim_onewire {
    ($peripherals:expr) => {{
        $crate::peripherals::onewire::OneWirePeripherals { data: $peripherals.PD0 }
    }};
}

/// Open-drain GPIO driving the DS18B20 data line.
///
/// Writing high only releases the pin, and reads sample the input register,
/// so a slave pulling the line low is seen even while we are "driving" high.
pub struct OneWireLine<'d> {
    pin: OutputOpenDrain<'d>,
}

impl<'d> OneWireLine<'d> {
    pub fn new(claims: OneWirePeripherals<'d>) -> Self {
        Self {
            pin: OutputOpenDrain::new(claims.data, Level::High, Speed::Medium),
        }
    }
}

impl<'d> OpenDrainLine for OneWireLine<'d> {
    fn pull_low(&mut self) {
        self.pin.set_low();
    }

    fn release(&mut self) {
        self.pin.set_high();
    }

    fn is_high(&mut self) -> bool {
        self.pin.is_high()
    }
}
