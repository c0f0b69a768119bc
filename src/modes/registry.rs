//! Mode axes and the buses each one can bridge to.

/// Which host link a mode is driven from.
///
/// Each axis has its own button and remembers its own position in its mode
/// list, so switching back to an axis resumes after the mode it last ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeAxis {
    /// USB CDC-ACM host link
    HostInterface,
    /// Secondary UART host link
    DownstreamBridge,
}

/// Downstream bus (and the device behind it) a mode bridges to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bus {
    /// Byte passthrough to the downstream UART
    Uart,
    /// BH1750 light sensor
    I2c,
    /// ADXL345 accelerometer
    Spi,
    /// DS18B20 temperature sensor
    OneWire,
}

const HOST_INTERFACE_MODES: [Bus; 4] = [Bus::Uart, Bus::I2c, Bus::Spi, Bus::OneWire];
const DOWNSTREAM_BRIDGE_MODES: [Bus; 4] = [Bus::Uart, Bus::I2c, Bus::Spi, Bus::OneWire];

impl ModeAxis {
    /// Ordered list of modes this axis cycles through.
    pub const fn modes(self) -> &'static [Bus] {
        match self {
            ModeAxis::HostInterface => &HOST_INTERFACE_MODES,
            ModeAxis::DownstreamBridge => &DOWNSTREAM_BRIDGE_MODES,
        }
    }

    /// Number of modes on this axis.
    pub const fn count(self) -> u8 {
        self.modes().len() as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            ModeAxis::HostInterface => "USB",
            ModeAxis::DownstreamBridge => "UART",
        }
    }
}

impl Bus {
    pub const fn label(self) -> &'static str {
        match self {
            Bus::Uart => "UART",
            Bus::I2c => "I2C",
            Bus::Spi => "SPI",
            Bus::OneWire => "1-Wire",
        }
    }

    /// Device on the far side of the bus, for diagnostics.
    pub const fn device(self) -> &'static str {
        match self {
            Bus::Uart => "serial2",
            Bus::I2c => "BH1750",
            Bus::Spi => "ADXL345",
            Bus::OneWire => "DS18B20",
        }
    }
}

/// A fully selected mode: host link plus downstream bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mode {
    pub axis: ModeAxis,
    pub bus: Bus,
}

/// Position of one axis in its mode list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisCursor {
    index: u8,
}

impl AxisCursor {
    /// Cursor on the first mode of an axis.
    pub const FIRST: Self = Self { index: 0 };

    /// Build a cursor from a raw index without validating it.
    ///
    /// An out-of-range index is only detected when the mode is resolved.
    pub const fn from_raw(index: u8) -> Self {
        Self { index }
    }

    pub const fn index(self) -> u8 {
        self.index
    }

    /// The following mode, wrapping back to the first after the last.
    pub const fn next(self, axis: ModeAxis) -> Self {
        Self {
            index: ((self.index as u16 + 1) % axis.count() as u16) as u8,
        }
    }

    /// Mode under the cursor, or `None` if the index is out of range.
    pub fn mode(self, axis: ModeAxis) -> Option<Bus> {
        axis.modes().get(self.index as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AXES: [ModeAxis; 2] = [ModeAxis::HostInterface, ModeAxis::DownstreamBridge];

    #[test]
    fn next_visits_every_mode_in_order() {
        for axis in AXES {
            let mut cursor = AxisCursor::FIRST;
            for expected in axis.modes() {
                assert_eq!(cursor.mode(axis), Some(*expected));
                cursor = cursor.next(axis);
            }
        }
    }

    #[test]
    fn count_steps_return_to_start() {
        for axis in AXES {
            for start in 0..axis.count() {
                let origin = AxisCursor::from_raw(start);
                let mut cursor = origin;
                for _ in 0..axis.count() {
                    cursor = cursor.next(axis);
                }
                assert_eq!(cursor, origin);
            }
        }
    }

    #[test]
    fn last_wraps_to_first() {
        let axis = ModeAxis::DownstreamBridge;
        let last = AxisCursor::from_raw(axis.count() - 1);
        assert_eq!(last.mode(axis), Some(Bus::OneWire));
        assert_eq!(last.next(axis), AxisCursor::FIRST);
    }

    #[test]
    fn corrupted_index_has_no_mode() {
        let cursor = AxisCursor::from_raw(200);
        assert_eq!(cursor.mode(ModeAxis::HostInterface), None);
        // Advancing still lands back inside the list
        assert!(cursor.next(ModeAxis::HostInterface).mode(ModeAxis::HostInterface).is_some());
    }

    #[test]
    fn labels() {
        assert_eq!(ModeAxis::HostInterface.label(), "USB");
        assert_eq!(ModeAxis::DownstreamBridge.label(), "UART");
        assert_eq!(Bus::OneWire.label(), "1-Wire");
        assert_eq!(Bus::Spi.device(), "ADXL345");
    }
}
