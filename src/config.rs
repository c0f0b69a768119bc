//! Compile-time bridge configuration.

/// Bus speeds and timing used by every bridge mode.
///
/// There is no persistence: the firmware builds this once at boot from
/// [`BridgeConfig::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    /// Baud rate of the secondary and downstream UARTs
    pub uart_baudrate: u32,
    /// I2C bus clock in Hz
    pub i2c_frequency: u32,
    /// SPI bus clock in Hz, also selects the accelerometer report interval
    pub spi_frequency: u32,
    /// 1-Wire speed shown on the status display
    pub onewire_speed: u32,
    /// Minimum time between two accepted button presses on the same input
    pub debounce_ms: u32,
    /// Sleep at the end of every main-loop iteration
    pub loop_period_ms: u64,
}

impl BridgeConfig {
    pub const DEFAULT: Self = Self {
        uart_baudrate: 115_200,
        i2c_frequency: 400_000,
        spi_frequency: 1_000_000,
        onewire_speed: 16_300,
        debounce_ms: 100,
        loop_period_ms: 10,
    };
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
