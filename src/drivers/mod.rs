//! Device drivers for the sensors behind the bridged buses.

/// ADXL345 accelerometer (SPI)
pub mod adxl345;
/// BH1750 light sensor (I2C)
pub mod bh1750;
/// DS18B20 temperature sensor (1-Wire)
pub mod ds18b20;
