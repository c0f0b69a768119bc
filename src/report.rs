//! Text lines exchanged with the host links.
//!
//! Everything a bridge mode prints is built here so the exact wire format is
//! unit-tested. Lines end in `\r\n` like a serial terminal expects.

use core::fmt::Write;

use heapless::String;

use crate::drivers::adxl345::{CalibrationOffset, DynamicSample};
use crate::drivers::ds18b20::{Ds18b20, OpenDrainLine};
use crate::modes::Mode;

/// Longest line any report produces
pub const LINE_CAPACITY: usize = 64;

pub type Line = String<LINE_CAPACITY>;

/// Host byte that requests a temperature reading in the 1-Wire modes
pub const TEMPERATURE_COMMAND: u8 = b'T';

pub const DS18B20_DISCONNECTED: &str = "Error:DS18B20_DISCONNECTED\r\n";
pub const BH1750_NOT_RESPONDING: &str = "Error:BH1750_NOT_RESPONDING\r\n";
pub const ADXL345_NOT_FOUND: &str = "Error:ADXL345_NOT_FOUND\r\n";
pub const ADXL345_BUS_ERROR: &str = "Error:ADXL345_BUS\r\n";

/// Build a line; anything past [`LINE_CAPACITY`] is dropped.
fn line(args: core::fmt::Arguments<'_>) -> Line {
    let mut out = Line::new();
    let _ = out.write_fmt(args);
    out
}

/// Reply to a temperature command.
pub fn temperature_reply(celsius: Option<f32>) -> Line {
    match celsius {
        Some(celsius) => line(format_args!("Temp:{:.2}C\r\n", celsius)),
        None => line(format_args!("{}", DS18B20_DISCONNECTED)),
    }
}

/// Answer one byte received on a host link in a 1-Wire mode.
///
/// Only [`TEMPERATURE_COMMAND`] triggers a reading; any other byte yields
/// `None` and no bus traffic.
pub async fn temperature_command<P, D, A>(command: u8, sensor: &mut Ds18b20<P, D>, delay: &mut A) -> Option<Line>
where
    P: OpenDrainLine,
    D: embedded_hal::delay::DelayNs,
    A: embedded_hal_async::delay::DelayNs,
{
    if command != TEMPERATURE_COMMAND {
        return None;
    }
    let celsius = sensor.read_celsius(delay).await;
    match celsius {
        Some(celsius) => info!("Sending temperature: {}C", celsius),
        None => warn!("DS18B20 not connected"),
    }
    Some(temperature_reply(celsius))
}

/// Periodic accelerometer report.
pub fn accel_report(sample: &DynamicSample) -> Line {
    line(format_args!("Dynamic accel: {:.3} g\r\n", sample.magnitude))
}

/// Calibration result, sent once per activation of the SPI mode.
pub fn offsets_report(offset: &CalibrationOffset) -> Line {
    line(format_args!(
        "Offsets: X={:.3} Y={:.3} Z={:.3}\r\n",
        offset.g[0], offset.g[1], offset.g[2]
    ))
}

/// Periodic light report.
pub fn lux_report(lux: f32) -> Line {
    line(format_args!("Lux: {:.1}\r\n", lux))
}

/// Banner announcing a newly activated mode.
pub fn mode_banner(mode: Mode) -> Line {
    line(format_args!(
        "Mode: {} <-> {} ({})\r\n",
        mode.axis.label(),
        mode.bus.label(),
        mode.bus.device()
    ))
}

/// Status display line: two labels and the mode's numeric parameter.
pub fn status_line(label_a: &str, label_b: &str, parameter: u32) -> Line {
    line(format_args!("[{} > {}] {}\r\n", label_a, label_b, parameter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ds18b20::OneWireBus;
    use crate::modes::{Bus, ModeAxis};
    use embassy_futures::block_on;

    /// Pulled-up line with nothing attached.
    struct EmptyBus;

    impl OpenDrainLine for EmptyBus {
        fn pull_low(&mut self) {}
        fn release(&mut self) {}
        fn is_high(&mut self) -> bool {
            true
        }
    }

    struct NoDelay;

    impl embedded_hal::delay::DelayNs for NoDelay {
        fn delay_ns(&mut self, _: u32) {}
    }

    impl embedded_hal_async::delay::DelayNs for NoDelay {
        async fn delay_ns(&mut self, _: u32) {}
    }

    #[test]
    fn temperature_command_without_sensor() {
        let mut sensor = Ds18b20::new(OneWireBus::new(EmptyBus, NoDelay));
        let reply = block_on(temperature_command(b'T', &mut sensor, &mut NoDelay));
        assert_eq!(reply.as_deref(), Some("Error:DS18B20_DISCONNECTED\r\n"));
    }

    #[test]
    fn other_bytes_are_ignored() {
        let mut sensor = Ds18b20::new(OneWireBus::new(EmptyBus, NoDelay));
        assert_eq!(block_on(temperature_command(b't', &mut sensor, &mut NoDelay)), None);
        assert_eq!(block_on(temperature_command(b'\n', &mut sensor, &mut NoDelay)), None);
    }

    #[test]
    fn temperature_replies() {
        assert_eq!(temperature_reply(Some(23.5)).as_str(), "Temp:23.50C\r\n");
        assert_eq!(temperature_reply(Some(-10.0625)).as_str(), "Temp:-10.06C\r\n");
        assert_eq!(temperature_reply(None).as_str(), "Error:DS18B20_DISCONNECTED\r\n");
    }

    #[test]
    fn accel_lines() {
        let sample = DynamicSample {
            accel: [0.0, 0.0, 0.0],
            magnitude: 0.25,
        };
        assert_eq!(accel_report(&sample).as_str(), "Dynamic accel: 0.250 g\r\n");

        let offset = CalibrationOffset { g: [1.0, -0.5, 0.0] };
        assert_eq!(offsets_report(&offset).as_str(), "Offsets: X=1.000 Y=-0.500 Z=0.000\r\n");
    }

    #[test]
    fn banners() {
        let mode = Mode {
            axis: ModeAxis::DownstreamBridge,
            bus: Bus::OneWire,
        };
        assert_eq!(mode_banner(mode).as_str(), "Mode: UART <-> 1-Wire (DS18B20)\r\n");
        assert_eq!(status_line("UART", "SPI", 1_000_000).as_str(), "[UART > SPI] 1000000\r\n");
        assert_eq!(lux_report(123.46).as_str(), "Lux: 123.5\r\n");
    }
}
