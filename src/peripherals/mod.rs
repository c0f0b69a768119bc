pub mod acm;
pub mod buttons;
pub mod i2c;
pub mod onewire;
pub mod spi;
pub mod system;
pub mod usart;
pub mod usb_system;

pub use acm::AcmConnection;
pub use i2c::{light_bus, LightBus};
pub use onewire::OneWireLine;
pub use spi::AccelSpi;
pub use system::init_system;
pub use usart::SerialPort;
pub use usb_system::UsbSystem;
