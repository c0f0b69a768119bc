//! Acquisition pipeline: bring-up, static calibration and per-cycle dynamic
//! acceleration.
//!
//! Calibration averages [`CALIBRATION_SAMPLES`] frames while the board sits
//! still and level, and keeps the mean (gravity included) as a per-axis
//! offset. Every later sample subtracts it, so the reported magnitude is the
//! acceleration on top of the calibration pose. It stops meaning anything once
//! the board is rotated; there is no check that the board really was still.

use embedded_hal_async::delay::DelayNs;
#[allow(unused_imports)]
use micromath::F32Ext;

use super::driver::{Adxl345, Error, RawSample, RegisterBus};
use super::registers::{DEVICE_ID, LSB_PER_G};

/// Frames averaged by a calibration run
pub const CALIBRATION_SAMPLES: u32 = 100;
/// Spacing between calibration frames
pub const CALIBRATION_SPACING_MS: u32 = 10;

/// Per-axis static bias in g.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationOffset {
    pub g: [f32; 3],
}

impl CalibrationOffset {
    /// Offset from per-axis sums of `count` raw samples.
    pub fn from_sums(sums: [i32; 3], count: u32) -> Self {
        let mean = |sum: i32| (sum as f32 / count as f32) / LSB_PER_G;
        Self {
            g: [mean(sums[0]), mean(sums[1]), mean(sums[2])],
        }
    }
}

/// Bias-corrected acceleration for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DynamicSample {
    /// Per-axis acceleration minus the calibration offset, in g
    pub accel: [f32; 3],
    /// Euclidean norm of `accel`, in g
    pub magnitude: f32,
}

impl DynamicSample {
    pub fn new(raw: RawSample, offset: &CalibrationOffset) -> Self {
        let g = raw.to_g();
        let accel = [g[0] - offset.g[0], g[1] - offset.g[1], g[2] - offset.g[2]];
        let magnitude = (accel[0] * accel[0] + accel[1] * accel[1] + accel[2] * accel[2]).sqrt();
        Self { accel, magnitude }
    }
}

/// Report interval for a given SPI clock. Slower clocks report less often.
pub const fn report_interval_ms(spi_frequency: u32) -> u64 {
    if spi_frequency <= 1_000_000 {
        10_000
    } else if spi_frequency <= 4_000_000 {
        4_000
    } else {
        1_000
    }
}

/// Fixed-interval deadline check driven by an external clock.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    interval_ms: u64,
    last_ms: Option<u64>,
}

impl Pacer {
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_ms: None,
        }
    }

    pub const fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// True on the first call and then whenever a full interval has elapsed
    /// since the last time it returned true.
    pub fn ready(&mut self, now_ms: u64) -> bool {
        match self.last_ms {
            Some(last) if now_ms.saturating_sub(last) < self.interval_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Result of the identity check done during setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceStatus {
    Present,
    /// DEVID did not match; samples are best-effort garbage
    Missing { device_id: u8 },
}

/// Outcome of [`AccelPipeline::setup`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupReport {
    pub status: DeviceStatus,
    pub offset: CalibrationOffset,
}

/// Accelerometer pipeline for one activation of the SPI bridge mode.
///
/// Owns the bus handle and the calibration offset until
/// [`release`](Self::release) tears it down.
pub struct AccelPipeline<B> {
    sensor: Adxl345<B>,
    offset: Option<CalibrationOffset>,
    status: Option<DeviceStatus>,
    pacer: Pacer,
}

impl<B: RegisterBus> AccelPipeline<B> {
    /// Wrap a bus handle. `spi_frequency` selects the report interval.
    pub fn new(bus: B, spi_frequency: u32) -> Self {
        Self {
            sensor: Adxl345::new(bus),
            offset: None,
            status: None,
            pacer: Pacer::new(report_interval_ms(spi_frequency)),
        }
    }

    /// Verify the device, configure it and calibrate.
    ///
    /// A DEVID mismatch is reported in the returned [`SetupReport`] and the
    /// configuration writes are skipped, but calibration still runs and the
    /// pipeline keeps working. Only bus errors abort setup.
    pub async fn setup<D: DelayNs>(&mut self, delay: &mut D) -> Result<SetupReport, Error<B::Error>> {
        self.offset = None;
        self.pacer.reset();

        let device_id = self.sensor.device_id().await?;
        debug!("ADXL345 device ID: 0x{:02X}", device_id);

        let status = if device_id == DEVICE_ID {
            self.sensor.configure().await?;
            info!("ADXL345 found and configured");
            DeviceStatus::Present
        } else {
            warn!(
                "ADXL345 not found: expected ID 0x{:02X}, got 0x{:02X}. Check wiring",
                DEVICE_ID,
                device_id
            );
            DeviceStatus::Missing { device_id }
        };
        self.status = Some(status);

        let offset = self.calibrate(delay).await?;
        Ok(SetupReport { status, offset })
    }

    /// Average [`CALIBRATION_SAMPLES`] frames into a new offset.
    pub async fn calibrate<D: DelayNs>(&mut self, delay: &mut D) -> Result<CalibrationOffset, Error<B::Error>> {
        let mut sums = [0i32; 3];
        for _ in 0..CALIBRATION_SAMPLES {
            let raw = self.sensor.read_raw().await?;
            sums[0] += i32::from(raw.x);
            sums[1] += i32::from(raw.y);
            sums[2] += i32::from(raw.z);
            delay.delay_ms(CALIBRATION_SPACING_MS).await;
        }

        let offset = CalibrationOffset::from_sums(sums, CALIBRATION_SAMPLES);
        info!(
            "Offsets: X={} Y={} Z={} g",
            offset.g[0], offset.g[1], offset.g[2]
        );
        self.offset = Some(offset);
        Ok(offset)
    }

    /// Read one frame and remove the calibration offset (zero if not calibrated).
    pub async fn sample(&mut self) -> Result<DynamicSample, Error<B::Error>> {
        let raw = self.sensor.read_raw().await?;
        Ok(DynamicSample::new(raw, &self.offset.unwrap_or_default()))
    }

    /// Take a sample if the report interval has elapsed at `now_ms`.
    pub async fn service(&mut self, now_ms: u64) -> Result<Option<DynamicSample>, Error<B::Error>> {
        if !self.pacer.ready(now_ms) {
            return Ok(None);
        }
        self.sample().await.map(Some)
    }

    pub fn offset(&self) -> Option<CalibrationOffset> {
        self.offset
    }

    pub fn status(&self) -> Option<DeviceStatus> {
        self.status
    }

    pub fn report_interval_ms(&self) -> u64 {
        self.pacer.interval_ms()
    }

    /// Tear down: drop the calibration and hand the bus back.
    pub fn release(self) -> B {
        self.sensor.release()
    }
}
