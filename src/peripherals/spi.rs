//! SPI4 configuration for the ADXL345 on the SPI bridge.
//!
//! Register transactions use a software chip select so a burst read of the
//! six data registers happens inside one CS-low window.

use embassy_stm32::{
    gpio::{Level, Output, Speed},
    mode::Async,
    peripherals::{DMA1_CH0, DMA1_CH1, PE11, PE12, PE13, PE14, SPI4},
    spi::{Config as SpiConfig, Error, Mode, Phase, Polarity, Spi},
    time::Hertz,
    Peri,
};
use multibridge::drivers::adxl345::registers::{burst_command, read_command, write_command};
use multibridge::drivers::adxl345::RegisterBus;

/// Peripheral collection for the accelerometer SPI interface
pub struct SpiPeripherals<'d> {
    pub spi4: Peri<'d, SPI4>,
    pub cs: Peri<'d, PE11>,         // CS
    pub sck: Peri<'d, PE12>,        // SCK
    pub miso: Peri<'d, PE13>,       // MISO
    pub mosi: Peri<'d, PE14>,       // MOSI
    pub dma_tx: Peri<'d, DMA1_CH0>, // TX DMA
    pub dma_rx: Peri<'d, DMA1_CH1>, // RX DMA
}

/// Macro to claim peripherals for AccelSpi
#[macro_export]
macro_rules! claim_accel_spi {
    ($peripherals:expr) => {{
        $crate::peripherals::spi::SpiPeripherals {
            spi4: $peripherals.SPI4,
            cs: $peripherals.PE11,         // CS
            sck: $peripherals.PE12,        // SCK
            miso: $peripherals.PE13,       // MISO
            mosi: $peripherals.PE14,       // MOSI
            dma_tx: $peripherals.DMA1_CH0, // TX DMA
            dma_rx: $peripherals.DMA1_CH1, // RX DMA
        }
    }};
}

/// SPI interface of the ADXL345.
///
/// The ADXL345 needs SPI mode 3 (CPOL=1, CPHA=1) and accepts up to 5 MHz.
/// The clock comes from the bridge configuration so the report interval and
/// the real bus speed stay in step.
pub struct AccelSpi<'d> {
    /// SPI peripheral instance with DMA
    spi: Spi<'d, Async>,
    /// Chip select pin (software controlled, idle high)
    cs: Output<'d>,
}

impl<'d> AccelSpi<'d> {
    /// Configure SPI4 for the accelerometer.
    ///
    /// # Arguments
    /// * `peripherals` - SpiPeripherals struct containing all required peripherals
    /// * `frequency` - SPI clock in Hz
    pub fn new(peripherals: SpiPeripherals<'d>, frequency: u32) -> Self {
        let mut config = SpiConfig::default();
        config.mode = Mode {
            polarity: Polarity::IdleHigh,
            phase: Phase::CaptureOnSecondTransition,
        };
        config.frequency = Hertz(frequency);

        // Chip select must idle high before the first clock edge
        let cs = Output::new(peripherals.cs, Level::High, Speed::VeryHigh);

        let spi = Spi::new(
            peripherals.spi4,
            peripherals.sck,
            peripherals.mosi,
            peripherals.miso,
            peripherals.dma_tx,
            peripherals.dma_rx,
            config,
        );

        Self { spi, cs }
    }
}

impl<'d> RegisterBus for AccelSpi<'d> {
    type Error = Error;

    /// Address byte with read and multi-byte bits clear, then the value.
    async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Error> {
        let tx_buf = [write_command(reg), value];

        self.cs.set_low();
        let result = self.spi.write(&tx_buf).await;
        self.cs.set_high();

        result
    }

    /// Address byte with the read bit set, one dummy byte clocks the value out.
    async fn read_register(&mut self, reg: u8) -> Result<u8, Error> {
        let tx_buf = [read_command(reg), 0x00];
        let mut rx_buf = [0u8; 2];

        self.cs.set_low();
        let result = self.spi.transfer(&mut rx_buf, &tx_buf).await;
        self.cs.set_high();

        result?;
        Ok(rx_buf[1])
    }

    /// Address byte with read and multi-byte bits set, then `buffer.len()`
    /// bytes from consecutive registers, all under one chip select.
    async fn read_register_burst(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Error> {
        let cmd = [burst_command(reg)];

        self.cs.set_low();
        let result = match self.spi.write(&cmd).await {
            Ok(()) => self.spi.read(buffer).await,
            Err(e) => Err(e),
        };
        self.cs.set_high();

        result
    }
}
