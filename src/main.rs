//! Firmware entry point for the multibridge board.
//!
//! Brings up the STM32H753, starts the USB and button tasks, then runs the
//! mode controller in the main task: consume button presses, service the
//! active mode, sleep one loop period, repeat.

#![no_std]
#![no_main]

mod apps;
mod peripherals;

use apps::{BridgeApp, BridgeHardware, StatusLog};
use embassy_executor::Spawner;
use embassy_time::Timer;
use multibridge::input::ModeButtons;
use multibridge::{info, BridgeConfig, ModeAxis, ModeController};
use peripherals::buttons::{DOWNSTREAM_BUTTON, HOST_BUTTON};
use peripherals::{init_system, AcmConnection, AccelSpi, OneWireLine, SerialPort, UsbSystem};

// Import panic handler and defmt RTT for debugging
#[cfg(not(feature = "debug"))]
use panic_halt as _;
#[cfg(feature = "debug")]
use {defmt_rtt as _, panic_probe as _};

/// Interval between heartbeat log lines
const HEARTBEAT_PERIOD_MS: u64 = 60_000;

/// Main application entry point
///
/// Claims every peripheral, spawns the background tasks and then never
/// returns: the mode controller runs here for the life of the device.
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting multibridge firmware v{}", env!("CARGO_PKG_VERSION"));

    let config = BridgeConfig::DEFAULT;
    let p = init_system();

    // USB device first: the ACM class has to be registered before the device is built
    let mut usb = UsbSystem::new(claim_usb!(p));
    let acm = AcmConnection::new(usb.builder(), claim_acm!(p));
    spawner.spawn(peripherals::usb_system::task(usb)).unwrap();

    let (host_input, downstream_input) = peripherals::buttons::split(claim_buttons!(p));
    spawner
        .spawn(peripherals::buttons::task(host_input, ModeAxis::HostInterface, &HOST_BUTTON))
        .unwrap();
    spawner
        .spawn(peripherals::buttons::task(
            downstream_input,
            ModeAxis::DownstreamBridge,
            &DOWNSTREAM_BUTTON,
        ))
        .unwrap();

    let hardware = BridgeHardware {
        acm,
        link: SerialPort::link(claim_link_uart!(p), config.uart_baudrate),
        downstream: SerialPort::downstream(claim_downstream_uart!(p), config.uart_baudrate),
        accel_bus: AccelSpi::new(claim_accel_spi!(p), config.spi_frequency),
        light_bus: peripherals::light_bus(claim_light_i2c!(p), config.i2c_frequency),
        onewire: OneWireLine::new(claim_onewire!(p)),
    };
    info!("System initialized, entering boot mode");

    let mut controller = ModeController::new(BridgeApp::new(hardware, config), StatusLog::new(), config);
    controller.start().await;

    let buttons = ModeButtons {
        host: &HOST_BUTTON,
        downstream: &DOWNSTREAM_BUTTON,
    };
    let heartbeat_every = (HEARTBEAT_PERIOD_MS / config.loop_period_ms).max(1);
    let mut iterations: u64 = 0;

    loop {
        controller.step(buttons).await;
        Timer::after_millis(config.loop_period_ms).await;

        iterations += 1;
        if iterations % heartbeat_every == 0 {
            info!("Heartbeat: {}", controller.display().current());
        }
    }
}
