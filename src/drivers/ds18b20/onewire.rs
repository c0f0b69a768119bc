//! Bit-banged 1-Wire master (standard speed).
//!
//! Timings follow Maxim application note 126. The line is open drain with an
//! external pull-up; the master only ever pulls it low or lets it float.

use embedded_hal::delay::DelayNs;

/// Open-drain data line of a 1-Wire bus.
pub trait OpenDrainLine {
    /// Actively drive the line low.
    fn pull_low(&mut self);
    /// Stop driving; the pull-up takes the line high unless a slave holds it.
    fn release(&mut self);
    /// Sample the line level.
    fn is_high(&mut self) -> bool;
}

/// 1-Wire bus master over an [`OpenDrainLine`] and a blocking microsecond delay.
pub struct OneWireBus<P, D> {
    line: P,
    delay: D,
}

impl<P: OpenDrainLine, D: DelayNs> OneWireBus<P, D> {
    pub fn new(mut line: P, delay: D) -> Self {
        line.release();
        Self { line, delay }
    }

    pub fn release(self) -> (P, D) {
        (self.line, self.delay)
    }

    /// Reset pulse. Returns whether at least one slave answered with a
    /// presence pulse.
    pub fn reset(&mut self) -> bool {
        self.line.pull_low();
        self.delay.delay_us(480);
        self.line.release();
        self.delay.delay_us(70);
        let presence = !self.line.is_high();
        self.delay.delay_us(410);
        presence
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.line.pull_low();
        if bit {
            self.delay.delay_us(6);
            self.line.release();
            self.delay.delay_us(64);
        } else {
            self.delay.delay_us(60);
            self.line.release();
            self.delay.delay_us(10);
        }
    }

    pub fn read_bit(&mut self) -> bool {
        self.line.pull_low();
        self.delay.delay_us(6);
        self.line.release();
        self.delay.delay_us(9);
        let bit = self.line.is_high();
        self.delay.delay_us(55);
        bit
    }

    /// Write one byte, least significant bit first.
    pub fn write_byte(&mut self, byte: u8) {
        for i in 0..8 {
            self.write_bit(byte & (1 << i) != 0);
        }
    }

    /// Read one byte, least significant bit first.
    pub fn read_byte(&mut self) -> u8 {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit() {
                byte |= 1 << i;
            }
        }
        byte
    }

    pub fn read_bytes(&mut self, buffer: &mut [u8]) {
        for byte in buffer.iter_mut() {
            *byte = self.read_byte();
        }
    }
}

/// Dallas/Maxim CRC-8 (x^8 + x^5 + x^4 + 1, reflected, init 0).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut byte = byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the level the master drives on every edge.
    #[derive(Default)]
    struct TraceLine {
        driven: Vec<bool>,
    }

    impl OpenDrainLine for TraceLine {
        fn pull_low(&mut self) {
            self.driven.push(false);
        }

        fn release(&mut self) {
            self.driven.push(true);
        }

        fn is_high(&mut self) -> bool {
            true
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _: u32) {}
    }

    #[test]
    fn crc_matches_app_note_example() {
        assert_eq!(crc8(&[0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00]), 0xA2);
    }

    #[test]
    fn crc_over_data_and_crc_is_zero() {
        let data = [0x28, 0xFF, 0x4C, 0x91, 0x62, 0x16, 0x03];
        let crc = crc8(&data);
        let mut framed = data.to_vec();
        framed.push(crc);
        assert_eq!(crc8(&framed), 0);
    }

    #[test]
    fn floating_line_has_no_presence() {
        let mut bus = OneWireBus::new(TraceLine::default(), NoDelay);
        assert!(!bus.reset());
    }

    #[test]
    fn floating_line_reads_ones() {
        let mut bus = OneWireBus::new(TraceLine::default(), NoDelay);
        assert_eq!(bus.read_byte(), 0xFF);
    }

    #[test]
    fn every_slot_starts_low_and_ends_released() {
        let mut bus = OneWireBus::new(TraceLine::default(), NoDelay);
        bus.write_byte(0xCC);
        let (line, _) = bus.release();
        // Initial release from `new`, then a low/high pair per bit
        assert_eq!(line.driven.len(), 1 + 16);
        for slot in line.driven[1..].chunks(2) {
            assert_eq!(slot, [false, true]);
        }
    }
}
