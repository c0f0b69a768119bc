//! USB device on the OTG_HS core with the external ULPI PHY.
//!
//! The device exposes a single CDC ACM function ([`super::acm`]). The device
//! state machine runs in its own task so enumeration and control requests are
//! answered while the main loop is busy in a mode.

use embassy_stm32::{
    bind_interrupts,
    peripherals::{self as stm32_peripherals, PA3, PA5, PB0, PB1, PB10, PB11, PB12, PB13, PB5, PC0, PC2, PC3, USB_OTG_HS},
    usb::{self, Driver, InterruptHandler},
    Peri,
};
use embassy_usb::Builder;
use multibridge::info;
use static_cell::ConstStaticCell;

/// Bulk endpoint size at high speed
pub const MAX_PACKET_SIZE: u16 = 512;

const DESCRIPTOR_BUFFER_SIZE: usize = 256;
const CONTROL_BUFFER_SIZE: usize = 64;

type UsbDriver<'d> = Driver<'d, USB_OTG_HS>;

bind_interrupts!(
    /// OTG_HS interrupt handler
    pub struct UsbInterrupts {
        OTG_HS => InterruptHandler<stm32_peripherals::USB_OTG_HS>;
    }
);

/// ULPI bus to the external PHY: clock, direction, next, stop and 8 data lines.
pub struct UlpiPins<'d> {
    pub clk: Peri<'d, PA5>,
    pub dir: Peri<'d, PC2>,
    pub nxt: Peri<'d, PC3>,
    pub stp: Peri<'d, PC0>,
    pub data: (
        Peri<'d, PA3>,
        Peri<'d, PB0>,
        Peri<'d, PB1>,
        Peri<'d, PB10>,
        Peri<'d, PB11>,
        Peri<'d, PB12>,
        Peri<'d, PB13>,
        Peri<'d, PB5>,
    ),
}

/// Everything [`UsbSystem::new`] takes ownership of
pub struct UsbClaims<'d> {
    pub otg: Peri<'d, USB_OTG_HS>,
    pub ulpi: UlpiPins<'d>,
    pub buffers: &'d mut UsbBuffers,
}

/// Macro to claim peripherals for UsbSystem
#[macro_export]
macro_rules! claim_usb {
    ($peripherals:expr) => {{
        $crate::peripherals::usb_system::UsbClaims {
            otg: $peripherals.USB_OTG_HS,
            ulpi: $crate::peripherals::usb_system::UlpiPins {
                clk: $peripherals.PA5,
                dir: $peripherals.PC2,
                nxt: $peripherals.PC3,
                stp: $peripherals.PC0,
                // D0..D7
                data: (
                    $peripherals.PA3,
                    $peripherals.PB0,
                    $peripherals.PB1,
                    $peripherals.PB10,
                    $peripherals.PB11,
                    $peripherals.PB12,
                    $peripherals.PB13,
                    $peripherals.PB5,
                ),
            },
            buffers: $crate::peripherals::usb_system::USB_BUFFERS.take(),
        }
    }};
}

/// Static storage the driver and builder borrow for the device lifetime.
#[repr(C, align(32))]
pub struct UsbBuffers {
    /// OUT endpoint FIFO, room for two full packets
    pub endpoint_out: [u8; MAX_PACKET_SIZE as usize * 2],
    pub config_descriptor: [u8; DESCRIPTOR_BUFFER_SIZE],
    pub bos_descriptor: [u8; DESCRIPTOR_BUFFER_SIZE],
    pub control: [u8; CONTROL_BUFFER_SIZE],
}

pub static USB_BUFFERS: ConstStaticCell<UsbBuffers> = ConstStaticCell::new(UsbBuffers::new());

impl UsbBuffers {
    pub const fn new() -> Self {
        Self {
            endpoint_out: [0u8; MAX_PACKET_SIZE as usize * 2],
            config_descriptor: [0u8; DESCRIPTOR_BUFFER_SIZE],
            bos_descriptor: [0u8; DESCRIPTOR_BUFFER_SIZE],
            control: [0u8; CONTROL_BUFFER_SIZE],
        }
    }
}

impl Default for UsbBuffers {
    fn default() -> Self {
        Self::new()
    }
}

/// USB device in its configuration phase: classes register on the builder,
/// then [`task`] builds and runs the device.
pub struct UsbSystem<'d> {
    builder: Builder<'d, UsbDriver<'d>>,
}

impl<'d> UsbSystem<'d> {
    pub fn new(claims: UsbClaims<'d>) -> Self {
        // pid.codes test VID/PID
        let mut config = embassy_usb::Config::new(0x1209, 0x0001);
        config.manufacturer = Some("Multibridge");
        config.product = Some("Multibridge USB/UART bridge");
        config.serial_number = Some(env!("CARGO_PKG_VERSION"));
        config.max_power = 100;
        config.max_packet_size_0 = 64;

        let mut driver_config = usb::Config::default();
        driver_config.vbus_detection = true;

        let UlpiPins { clk, dir, nxt, stp, data } = claims.ulpi;
        let (d0, d1, d2, d3, d4, d5, d6, d7) = data;
        let driver = Driver::new_hs_ulpi(
            claims.otg,
            UsbInterrupts,
            clk,
            dir,
            nxt,
            stp,
            d0,
            d1,
            d2,
            d3,
            d4,
            d5,
            d6,
            d7,
            &mut claims.buffers.endpoint_out,
            driver_config,
        );

        let builder = Builder::new(
            driver,
            config,
            &mut claims.buffers.config_descriptor,
            &mut claims.buffers.bos_descriptor,
            &mut [],
            &mut claims.buffers.control,
        );
        info!("USB device configured, VID:PID 1209:0001");

        Self { builder }
    }

    /// Builder for class registration. Classes must be registered before
    /// the system is handed to [`task`].
    pub fn builder(&mut self) -> &mut Builder<'d, UsbDriver<'d>> {
        &mut self.builder
    }
}

/// Builds the device from the registered classes and runs it forever
#[embassy_executor::task]
pub async fn task(usb_system: UsbSystem<'static>) -> ! {
    let mut device = usb_system.builder.build();
    info!("USB device running");
    device.run().await
}
