//! I2C1 configuration for the BH1750 on the I2C bridge.

use embassy_stm32::{
    bind_interrupts,
    i2c::{self, I2c},
    mode::Async,
    peripherals::{self as stm32_peripherals, DMA1_CH4, DMA1_CH5, I2C1, PB8, PB9},
    time::Hertz,
    Peri,
};

bind_interrupts!(
    /// I2C1 event and error interrupt handlers
    pub struct I2cInterrupts {
        I2C1_EV => i2c::EventInterruptHandler<stm32_peripherals::I2C1>;
        I2C1_ER => i2c::ErrorInterruptHandler<stm32_peripherals::I2C1>;
    }
);

/// Peripheral collection for the light sensor bus
pub struct I2cPeripherals<'d> {
    pub i2c1: Peri<'d, I2C1>,
    pub scl: Peri<'d, PB8>,
    pub sda: Peri<'d, PB9>,
    pub dma_tx: Peri<'d, DMA1_CH4>,
    pub dma_rx: Peri<'d, DMA1_CH5>,
}

/// Macro to claim peripherals for the light sensor bus
#[macro_export]
macro_rules! claim_light_i2c {
    ($peripherals:expr) => {{
        $crate::peripherals::i2c::I2cPeripherals {
            i2c1: $peripherals.I2C1,
            scl: $peripherals.PB8,
            sda: $peripherals.PB9,
            dma_tx: $peripherals.DMA1_CH4,
            dma_rx: $peripherals.DMA1_CH5,
        }
    }};
}

/// I2C bus type handed to the BH1750 driver
pub type LightBus<'d> = I2c<'d, Async>;

/// Bring up I2C1 at `frequency` Hz. The board has external pull-ups on both lines.
pub fn light_bus(claims: I2cPeripherals<'_>, frequency: u32) -> LightBus<'_> {
    let mut config = i2c::Config::default();
    config.frequency = Hertz(frequency);

    I2c::new(
        claims.i2c1,
        claims.scl,
        claims.sda,
        I2cInterrupts,
        claims.dma_tx,
        claims.dma_rx,
        config,
    )
}
