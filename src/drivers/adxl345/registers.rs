//! ADXL345 register map (the subset the bridge uses) and SPI command encoding.

/// Register addresses, from the ADXL345 datasheet register map.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    DevId = 0x00,
    PowerCtl = 0x2D,
    DataFormat = 0x31,
    /// First of the six data registers DATAX0..DATAZ1
    DataX0 = 0x32,
}

/// Fixed DEVID value of a genuine ADXL345
pub const DEVICE_ID: u8 = 0xE5;

/// DATA_FORMAT: full resolution (scale stays at 4 mg/LSB for every range)
pub const FULL_RES: u8 = 0b0000_1000;
/// DATA_FORMAT: +/-2 g range
pub const RANGE_2G: u8 = 0b0000_0000;
/// POWER_CTL: measurement mode
pub const MEASURE: u8 = 0b0000_1000;

/// Number of bytes in one X/Y/Z data frame
pub const FRAME_LEN: usize = 6;

/// Counts per g in full-resolution mode
pub const LSB_PER_G: f32 = 256.0;

/// Direction bit: set for reads
const READ_BIT: u8 = 0x80;
/// Multi-byte bit: set to auto-increment the address during a burst
const MULTI_BYTE_BIT: u8 = 0x40;
/// The address field is six bits wide
const ADDRESS_MASK: u8 = 0x3F;

/// First byte of a single-register write.
pub const fn write_command(reg: u8) -> u8 {
    reg & ADDRESS_MASK
}

/// First byte of a single-register read.
pub const fn read_command(reg: u8) -> u8 {
    (reg & ADDRESS_MASK) | READ_BIT
}

/// First byte of an auto-incrementing multi-register read.
pub const fn burst_command(reg: u8) -> u8 {
    (reg & ADDRESS_MASK) | READ_BIT | MULTI_BYTE_BIT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_bytes() {
        assert_eq!(write_command(Register::DataFormat as u8), 0x31);
        assert_eq!(write_command(Register::PowerCtl as u8), 0x2D);
        assert_eq!(read_command(Register::DevId as u8), 0x80);
        assert_eq!(burst_command(Register::DataX0 as u8), 0xF2);
    }

    #[test]
    fn write_never_sets_direction_bits() {
        assert_eq!(write_command(0xFF) & 0xC0, 0);
    }
}
