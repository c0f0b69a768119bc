//! BH1750 ambient light sensor on the I2C bridge.

use embedded_hal_async::i2c::I2c;

/// Address with the ADDR pin low
pub const DEFAULT_ADDRESS: u8 = 0x23;

#[repr(u8)]
#[derive(Copy, Clone)]
enum Instruction {
    PowerOn = 0x01,
    ContinuousHighRes = 0x10,
}

/// Counts per lux in high-resolution mode with the default measurement time
const COUNTS_PER_LUX: f32 = 1.2;

/// First high-resolution measurement takes up to 180 ms
pub const MEASUREMENT_TIME_MS: u32 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C transaction failed (usually a NACK: sensor missing)
    Bus(E),
}

/// Convert a raw big-endian measurement to lux.
pub fn lux_from_raw(raw: [u8; 2]) -> f32 {
    f32::from(u16::from_be_bytes(raw)) / COUNTS_PER_LUX
}

pub struct Bh1750<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Bh1750<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn release(self) -> I {
        self.i2c
    }

    /// Power the sensor up and start continuous high-resolution measurement.
    pub async fn start(&mut self) -> Result<(), Error<I::Error>> {
        self.send(Instruction::PowerOn).await?;
        self.send(Instruction::ContinuousHighRes).await
    }

    /// Latest measurement in lux.
    pub async fn read_lux(&mut self) -> Result<f32, Error<I::Error>> {
        let mut raw = [0u8; 2];
        self.i2c.read(self.address, &mut raw).await.map_err(Error::Bus)?;
        Ok(lux_from_raw(raw))
    }

    async fn send(&mut self, instruction: Instruction) -> Result<(), Error<I::Error>> {
        self.i2c
            .write(self.address, &[instruction as u8])
            .await
            .map_err(Error::Bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embedded_hal_async::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

    /// Single BH1750 at the default address returning a fixed reading.
    struct FakeI2c {
        reading: [u8; 2],
        written: Vec<u8>,
    }

    impl ErrorType for FakeI2c {
        type Error = ErrorKind;
    }

    impl I2c for FakeI2c {
        async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
            if address != DEFAULT_ADDRESS {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => self.written.extend_from_slice(bytes),
                    Operation::Read(buffer) => buffer.copy_from_slice(&self.reading[..buffer.len()]),
                }
            }
            Ok(())
        }
    }

    #[test]
    fn raw_to_lux() {
        assert_eq!(lux_from_raw([0x00, 0x00]), 0.0);
        assert!((lux_from_raw([0x01, 0x2C]) - 250.0).abs() < 1e-3);
        assert!((lux_from_raw([0xFF, 0xFF]) - 54_612.5).abs() < 1e-1);
    }

    #[test]
    fn start_then_read() {
        let fake = FakeI2c {
            reading: [0x00, 0x78],
            written: Vec::new(),
        };
        let mut sensor = Bh1750::new(fake, DEFAULT_ADDRESS);
        block_on(sensor.start()).unwrap();
        let lux = block_on(sensor.read_lux()).unwrap();
        assert!((lux - 100.0).abs() < 1e-3);
        assert_eq!(sensor.release().written, vec![0x01, 0x10]);
    }

    #[test]
    fn missing_sensor_is_a_bus_error() {
        let fake = FakeI2c {
            reading: [0; 2],
            written: Vec::new(),
        };
        let mut sensor = Bh1750::new(fake, 0x5C);
        assert_eq!(
            block_on(sensor.start()),
            Err(Error::Bus(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)))
        );
    }
}
