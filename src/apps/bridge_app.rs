//! Bridge application: the hardware side of every mode.
//!
//! [`BridgeApp`] implements [`ModeHandler`] for the real buses. The mode
//! controller in the library decides *which* mode is active; this file decides
//! what each mode does with the peripherals:
//!
//! | Bus    | Setup                              | Service                               |
//! |--------|------------------------------------|---------------------------------------|
//! | UART   | banner                             | relay host link <-> USART2            |
//! | I2C    | power up BH1750                    | lux report every second               |
//! | SPI    | ADXL345 check and calibration      | dynamic acceleration at the SPI pace  |
//! | 1-Wire | presence check                     | answer `T` with a temperature reading |
//!
//! The host link of a mode is the CDC ACM port for the host-interface axis and
//! USART1 for the downstream-bridge axis.

use embassy_time::{Delay, Instant, Timer};
use multibridge::drivers::adxl345::{AccelPipeline, DeviceStatus, Pacer};
use multibridge::drivers::bh1750::{self, Bh1750};
use multibridge::drivers::ds18b20::{Ds18b20, OneWireBus};
use multibridge::report;
use multibridge::{debug, error, info, warn, BridgeConfig, Bus, Mode, ModeAxis, ModeHandler};

use crate::peripherals::acm::PACKET_BUFFER_SIZE;
use crate::peripherals::{AcmConnection, AccelSpi, LightBus, OneWireLine, SerialPort};

/// Relay buffer; one full-speed USB packet fits
const RELAY_BUFFER_SIZE: usize = PACKET_BUFFER_SIZE;

/// Light reports are sent once a second
const LUX_REPORT_INTERVAL_MS: u64 = 1000;

type Thermometer = Ds18b20<OneWireLine<'static>, Delay>;

/// Every peripheral the bridge modes use.
pub struct BridgeHardware {
    /// Primary host link (USB CDC ACM)
    pub acm: AcmConnection<'static>,
    /// Secondary host link (USART1)
    pub link: SerialPort<'static>,
    /// Downstream UART (USART2)
    pub downstream: SerialPort<'static>,
    pub accel_bus: AccelSpi<'static>,
    pub light_bus: LightBus<'static>,
    pub onewire: OneWireLine<'static>,
}

/// SPI bus slot: idle, or owned by a running pipeline.
enum AccelSlot {
    Idle(AccelSpi<'static>),
    Active(AccelPipeline<AccelSpi<'static>>),
    /// Transient while ownership moves between states
    Empty,
}

/// I2C bus slot: idle, or owned by the light sensor driver.
enum LightSlot {
    Idle(LightBus<'static>),
    Active(Bh1750<LightBus<'static>>),
    Empty,
}

/// Mode handler for the physical bridge.
pub struct BridgeApp {
    config: BridgeConfig,
    acm: AcmConnection<'static>,
    link: SerialPort<'static>,
    downstream: SerialPort<'static>,
    accel: AccelSlot,
    light: LightSlot,
    light_pacer: Pacer,
    thermometer: Thermometer,
}

impl BridgeApp {
    pub fn new(hardware: BridgeHardware, config: BridgeConfig) -> Self {
        Self {
            config,
            acm: hardware.acm,
            link: hardware.link,
            downstream: hardware.downstream,
            accel: AccelSlot::Idle(hardware.accel_bus),
            light: LightSlot::Idle(hardware.light_bus),
            light_pacer: Pacer::new(LUX_REPORT_INTERVAL_MS),
            thermometer: Ds18b20::new(OneWireBus::new(hardware.onewire, Delay)),
        }
    }

    /// Send `data` to the host link of `axis`.
    ///
    /// A closed USB port or a UART error loses the data; the mode keeps running.
    async fn host_write(&mut self, axis: ModeAxis, data: &[u8]) {
        match axis {
            ModeAxis::HostInterface => {
                if self.acm.write(data).await.is_err() {
                    debug!("USB host not listening, dropped {} bytes", data.len());
                }
            }
            ModeAxis::DownstreamBridge => {
                if self.link.write(data).await.is_err() {
                    warn!("USART1 write failed, dropped {} bytes", data.len());
                }
            }
        }
    }

    /// Whatever the host link of `axis` received within its poll window.
    async fn host_read(&mut self, axis: ModeAxis, buffer: &mut [u8]) -> usize {
        match axis {
            ModeAxis::HostInterface => self.acm.poll_read(buffer).await.unwrap_or(0),
            ModeAxis::DownstreamBridge => self.link.poll_read(buffer).await,
        }
    }

    async fn send_line(&mut self, axis: ModeAxis, line: &str) {
        self.host_write(axis, line.as_bytes()).await;
    }

    /// UART passthrough, both directions, one poll window each.
    async fn relay(&mut self, axis: ModeAxis) {
        let mut buffer = [0u8; RELAY_BUFFER_SIZE];

        let received = self.host_read(axis, &mut buffer).await;
        if received > 0 && self.downstream.write(&buffer[..received]).await.is_err() {
            warn!("USART2 write failed, dropped {} bytes", received);
        }

        let received = self.downstream.poll_read(&mut buffer).await;
        if received > 0 {
            self.host_write(axis, &buffer[..received]).await;
        }
    }

    async fn setup_light(&mut self, axis: ModeAxis) {
        let bus = match core::mem::replace(&mut self.light, LightSlot::Empty) {
            LightSlot::Idle(bus) => bus,
            LightSlot::Active(sensor) => sensor.release(),
            LightSlot::Empty => {
                error!("I2C bus lost, light sensor unavailable");
                return;
            }
        };

        let mut sensor = Bh1750::new(bus, bh1750::DEFAULT_ADDRESS);
        match sensor.start().await {
            Ok(()) => {
                info!("BH1750 started, waiting for the first measurement");
                Timer::after_millis(u64::from(bh1750::MEASUREMENT_TIME_MS)).await;
            }
            Err(_) => {
                warn!("BH1750 did not acknowledge power-up");
                self.send_line(axis, report::BH1750_NOT_RESPONDING).await;
            }
        }
        self.light = LightSlot::Active(sensor);
        self.light_pacer.reset();
    }

    async fn service_light(&mut self, axis: ModeAxis) {
        if !self.light_pacer.ready(Instant::now().as_millis()) {
            return;
        }
        let reading = match &mut self.light {
            LightSlot::Active(sensor) => sensor.read_lux().await,
            _ => return,
        };
        match reading {
            Ok(lux) => {
                let line = report::lux_report(lux);
                self.send_line(axis, &line).await;
            }
            Err(_) => {
                warn!("BH1750 read failed");
                self.send_line(axis, report::BH1750_NOT_RESPONDING).await;
            }
        }
    }

    fn teardown_light(&mut self) {
        self.light = match core::mem::replace(&mut self.light, LightSlot::Empty) {
            LightSlot::Active(sensor) => LightSlot::Idle(sensor.release()),
            other => other,
        };
    }

    async fn setup_accel(&mut self, axis: ModeAxis) {
        let bus = match core::mem::replace(&mut self.accel, AccelSlot::Empty) {
            AccelSlot::Idle(bus) => bus,
            AccelSlot::Active(pipeline) => pipeline.release(),
            AccelSlot::Empty => {
                error!("SPI bus lost, accelerometer unavailable");
                return;
            }
        };

        let mut pipeline = AccelPipeline::new(bus, self.config.spi_frequency);
        info!(
            "Calibrating ADXL345, reporting every {} ms",
            pipeline.report_interval_ms()
        );
        match pipeline.setup(&mut Delay).await {
            Ok(setup) => {
                if let DeviceStatus::Missing { .. } = setup.status {
                    self.send_line(axis, report::ADXL345_NOT_FOUND).await;
                }
                let line = report::offsets_report(&setup.offset);
                self.send_line(axis, &line).await;
            }
            Err(_) => {
                error!("SPI transfer failed during ADXL345 setup");
                self.send_line(axis, report::ADXL345_BUS_ERROR).await;
            }
        }
        self.accel = AccelSlot::Active(pipeline);
    }

    async fn service_accel(&mut self, axis: ModeAxis) {
        let line = match &mut self.accel {
            AccelSlot::Active(pipeline) => match pipeline.service(Instant::now().as_millis()).await {
                Ok(Some(sample)) => report::accel_report(&sample),
                Ok(None) => return,
                Err(_) => {
                    warn!("SPI transfer failed while sampling");
                    return;
                }
            },
            _ => return,
        };
        self.send_line(axis, &line).await;
    }

    fn teardown_accel(&mut self) {
        self.accel = match core::mem::replace(&mut self.accel, AccelSlot::Empty) {
            AccelSlot::Active(pipeline) => AccelSlot::Idle(pipeline.release()),
            other => other,
        };
    }

    /// Answer temperature requests from the host link.
    async fn service_thermometer(&mut self, axis: ModeAxis) {
        let mut buffer = [0u8; RELAY_BUFFER_SIZE];
        let received = self.host_read(axis, &mut buffer).await;

        for &command in &buffer[..received] {
            if let Some(reply) = report::temperature_command(command, &mut self.thermometer, &mut Delay).await {
                self.send_line(axis, &reply).await;
            }
        }
    }
}

impl ModeHandler for BridgeApp {
    async fn setup(&mut self, mode: Mode) {
        let banner = report::mode_banner(mode);
        self.send_line(mode.axis, &banner).await;

        match mode.bus {
            Bus::Uart => info!("Relaying {} <-> USART2", mode.axis.label()),
            Bus::I2c => self.setup_light(mode.axis).await,
            Bus::Spi => self.setup_accel(mode.axis).await,
            Bus::OneWire => {
                if self.thermometer.is_present() {
                    info!("DS18B20 presence pulse detected");
                } else {
                    warn!("No presence pulse on the 1-Wire bus");
                }
            }
        }
    }

    async fn service(&mut self, mode: Mode) {
        match mode.bus {
            Bus::Uart => self.relay(mode.axis).await,
            Bus::I2c => self.service_light(mode.axis).await,
            Bus::Spi => self.service_accel(mode.axis).await,
            Bus::OneWire => self.service_thermometer(mode.axis).await,
        }
    }

    async fn teardown(&mut self, mode: Mode) {
        match mode.bus {
            Bus::I2c => self.teardown_light(),
            Bus::Spi => self.teardown_accel(),
            Bus::Uart | Bus::OneWire => {}
        }
    }
}
