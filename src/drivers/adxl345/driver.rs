//! ADXL345 register-level driver.
//!
//! The driver talks to the chip through a [`RegisterBus`], which hides how a
//! transaction is framed on the wire (chip select, command byte encoding).
//! The firmware implements it for SPI4 with a software chip select; tests
//! implement it with an in-memory register file.

use super::registers::{Register, FRAME_LEN, FULL_RES, LSB_PER_G, MEASURE, RANGE_2G};

/// Register access over a synchronous serial bus.
///
/// Every call is one exclusive bus transaction: chip select is asserted for
/// the whole call and released before it returns.
#[allow(async_fn_in_trait)]
pub trait RegisterBus {
    type Error;

    /// Write a single register.
    async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;

    /// Read a single register.
    async fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error>;

    /// Read `buffer.len()` consecutive registers starting at `reg`.
    async fn read_register_burst(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;
}

/// Accelerometer errors, wrapping the bus error type `E`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Bus transaction failed
    Bus(E),
}

/// One X/Y/Z reading in raw counts, taken from a single burst frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl RawSample {
    /// Decode DATAX0..DATAZ1 (little-endian pairs).
    pub fn from_frame(frame: &[u8; FRAME_LEN]) -> Self {
        Self {
            x: i16::from_le_bytes([frame[0], frame[1]]),
            y: i16::from_le_bytes([frame[2], frame[3]]),
            z: i16::from_le_bytes([frame[4], frame[5]]),
        }
    }

    /// Convert to g using the full-resolution scale.
    pub fn to_g(self) -> [f32; 3] {
        [
            f32::from(self.x) / LSB_PER_G,
            f32::from(self.y) / LSB_PER_G,
            f32::from(self.z) / LSB_PER_G,
        ]
    }
}

/// ADXL345 driver
pub struct Adxl345<B> {
    bus: B,
}

impl<B: RegisterBus> Adxl345<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Give the bus handle back.
    pub fn release(self) -> B {
        self.bus
    }

    /// Read the DEVID register.
    pub async fn device_id(&mut self) -> Result<u8, Error<B::Error>> {
        self.bus
            .read_register(Register::DevId as u8)
            .await
            .map_err(Error::Bus)
    }

    /// Select full-resolution +/-2 g and start measuring.
    pub async fn configure(&mut self) -> Result<(), Error<B::Error>> {
        self.bus
            .write_register(Register::DataFormat as u8, FULL_RES | RANGE_2G)
            .await
            .map_err(Error::Bus)?;
        self.bus
            .write_register(Register::PowerCtl as u8, MEASURE)
            .await
            .map_err(Error::Bus)
    }

    /// Read all three axes as one burst so they come from the same instant.
    pub async fn read_raw(&mut self) -> Result<RawSample, Error<B::Error>> {
        let mut frame = [0u8; FRAME_LEN];
        self.bus
            .read_register_burst(Register::DataX0 as u8, &mut frame)
            .await
            .map_err(Error::Bus)?;
        Ok(RawSample::from_frame(&frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_decodes_little_endian() {
        let raw = RawSample::from_frame(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(raw, RawSample { x: 256, y: 0, z: 0 });
    }

    #[test]
    fn frame_decodes_negative_axes() {
        let raw = RawSample::from_frame(&[0x00, 0xFF, 0xFF, 0xFF, 0x34, 0x12]);
        assert_eq!(raw, RawSample { x: -256, y: -1, z: 0x1234 });
    }

    #[test]
    fn counts_to_g() {
        let g = RawSample { x: 256, y: -128, z: 0 }.to_g();
        assert_eq!(g, [1.0, -0.5, 0.0]);
    }
}
