//! DS18B20 temperature sensor, single device on the bus.

use embedded_hal::delay::DelayNs;
use embedded_hal_async::delay::DelayNs as AsyncDelayNs;

use super::onewire::{crc8, OneWireBus, OpenDrainLine};

#[repr(u8)]
#[derive(Copy, Clone)]
enum Command {
    SkipRom = 0xCC,
    ConvertT = 0x44,
    ReadScratchpad = 0xBE,
}

/// Worst-case 12-bit conversion time
pub const CONVERSION_TIME_MS: u32 = 750;

/// Scratchpad length including the CRC byte
pub const SCRATCHPAD_LEN: usize = 9;

/// Measurable range of the DS18B20
const MIN_CELSIUS: f32 = -55.0;
const MAX_CELSIUS: f32 = 125.0;

/// Decode a scratchpad read. Returns `None` for anything that cannot come
/// from a connected sensor: CRC mismatch, an all-zero read (line stuck low)
/// or a value outside the sensor range.
pub fn decode_scratchpad(scratchpad: &[u8; SCRATCHPAD_LEN]) -> Option<f32> {
    if scratchpad.iter().all(|&b| b == 0) {
        return None;
    }
    if crc8(&scratchpad[..SCRATCHPAD_LEN - 1]) != scratchpad[SCRATCHPAD_LEN - 1] {
        return None;
    }
    let raw = i16::from_le_bytes([scratchpad[0], scratchpad[1]]);
    let celsius = f32::from(raw) / 16.0;
    (MIN_CELSIUS..=MAX_CELSIUS).contains(&celsius).then_some(celsius)
}

/// DS18B20 addressed with Skip ROM, so exactly one sensor may be attached.
pub struct Ds18b20<P, D> {
    bus: OneWireBus<P, D>,
}

impl<P: OpenDrainLine, D: DelayNs> Ds18b20<P, D> {
    pub fn new(bus: OneWireBus<P, D>) -> Self {
        Self { bus }
    }

    pub fn release(self) -> OneWireBus<P, D> {
        self.bus
    }

    /// Whether a device answers the reset pulse.
    pub fn is_present(&mut self) -> bool {
        self.bus.reset()
    }

    /// Start a conversion, wait for it and read the result.
    ///
    /// `None` means the sensor is disconnected or the read was corrupted.
    pub async fn read_celsius<A: AsyncDelayNs>(&mut self, delay: &mut A) -> Option<f32> {
        if !self.bus.reset() {
            return None;
        }
        self.bus.write_byte(Command::SkipRom as u8);
        self.bus.write_byte(Command::ConvertT as u8);

        delay.delay_ms(CONVERSION_TIME_MS).await;

        if !self.bus.reset() {
            return None;
        }
        self.bus.write_byte(Command::SkipRom as u8);
        self.bus.write_byte(Command::ReadScratchpad as u8);

        let mut scratchpad = [0u8; SCRATCHPAD_LEN];
        self.bus.read_bytes(&mut scratchpad);
        decode_scratchpad(&scratchpad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    fn scratchpad(lsb: u8, msb: u8) -> [u8; SCRATCHPAD_LEN] {
        let mut pad = [lsb, msb, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00];
        pad[8] = crc8(&pad[..8]);
        pad
    }

    #[test]
    fn power_on_scratchpad_reads_85() {
        let pad = [0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x1C];
        assert_eq!(decode_scratchpad(&pad), Some(85.0));
    }

    #[test]
    fn negative_temperature() {
        assert_eq!(decode_scratchpad(&scratchpad(0x5E, 0xFF)), Some(-10.125));
    }

    #[test]
    fn fractional_temperature() {
        assert_eq!(decode_scratchpad(&scratchpad(0x91, 0x01)), Some(25.0625));
    }

    #[test]
    fn bad_crc_is_rejected() {
        let mut pad = scratchpad(0x91, 0x01);
        pad[8] ^= 0x01;
        assert_eq!(decode_scratchpad(&pad), None);
    }

    #[test]
    fn all_zero_read_is_rejected() {
        assert_eq!(decode_scratchpad(&[0; SCRATCHPAD_LEN]), None);
    }

    #[test]
    fn out_of_range_is_rejected() {
        // -127 C, the conventional "disconnected" value
        assert_eq!(decode_scratchpad(&scratchpad(0x10, 0xF8)), None);
    }

    /// Line level fixed by a fault or by the absence of any device.
    struct StuckLine(bool);

    impl OpenDrainLine for StuckLine {
        fn pull_low(&mut self) {}
        fn release(&mut self) {}
        fn is_high(&mut self) -> bool {
            self.0
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _: u32) {}
    }

    impl AsyncDelayNs for NoDelay {
        async fn delay_ns(&mut self, _: u32) {}
    }

    #[test]
    fn no_sensor_reads_as_disconnected() {
        let mut sensor = Ds18b20::new(OneWireBus::new(StuckLine(true), NoDelay));
        assert!(!sensor.is_present());
        assert_eq!(block_on(sensor.read_celsius(&mut NoDelay)), None);
    }

    #[test]
    fn shorted_line_reads_as_disconnected() {
        let mut sensor = Ds18b20::new(OneWireBus::new(StuckLine(false), NoDelay));
        // Looks like a presence pulse, but the scratchpad is all zeros
        assert!(sensor.is_present());
        assert_eq!(block_on(sensor.read_celsius(&mut NoDelay)), None);
    }
}
