//! CDC ACM virtual serial port: the primary host link.
//!
//! Reads are polled with a short window so the main loop keeps servicing the
//! active mode while the host is silent. Writes are dropped while no terminal
//! has the port open instead of blocking the loop.

use embassy_stm32::{peripherals::USB_OTG_HS, usb::Driver};
pub use embassy_usb::class::cdc_acm::State;
use embassy_time::{with_timeout, Duration};
use embassy_usb::{class::cdc_acm::CdcAcmClass, driver::EndpointError, Builder};
use multibridge::{debug, info, warn};
use static_cell::StaticCell;

use super::usb_system::MAX_PACKET_SIZE;

/// Receive buffer size a caller must provide to [`AcmConnection::poll_read`]
pub const PACKET_BUFFER_SIZE: usize = MAX_PACKET_SIZE as usize;

/// How long a poll waits for a packet before giving the loop back
const POLL_WINDOW_MS: u64 = 1;
/// Upper bound on one packet write when the host stops reading
const WRITE_TIMEOUT_MS: u64 = 50;

pub static ACM_STATE: StaticCell<State<'static>> = StaticCell::new();

/// Peripheral collection for ACM interface
pub struct AcmClaims<'d> {
    pub acm_state: &'d mut State<'d>,
}

/// Macro to claim peripherals for AcmConnection
#[macro_export]
macro_rules! claim_acm {
    ($peripherals:expr) => {{
        $crate::peripherals::acm::AcmClaims {
            acm_state: $crate::peripherals::acm::ACM_STATE.init(embassy_usb::class::cdc_acm::State::new()),
        }
    }};
}

/// The host closed the port or the cable is out.
#[derive(Debug, Clone, Copy)]
pub struct Disconnected;

impl From<EndpointError> for Disconnected {
    fn from(error: EndpointError) -> Self {
        if let EndpointError::BufferOverflow = error {
            warn!("USB packet larger than the receive buffer");
        }
        Disconnected
    }
}

/// CDC ACM connection carrying the bridge's text traffic.
pub struct AcmConnection<'d> {
    class: CdcAcmClass<'d, Driver<'d, USB_OTG_HS>>,
}

impl<'d> AcmConnection<'d> {
    /// Register the CDC ACM class on the USB builder.
    pub fn new(builder: &mut Builder<'d, Driver<'d, USB_OTG_HS>>, claims: AcmClaims<'d>) -> Self {
        info!("CDC ACM connection initialized");
        Self {
            class: CdcAcmClass::new(builder, claims.acm_state, MAX_PACKET_SIZE),
        }
    }

    /// Whether a terminal has the port open (DTR asserted).
    pub fn is_open(&self) -> bool {
        self.class.dtr()
    }

    /// Send `data`, split into packets.
    ///
    /// Returns `Err(Disconnected)` without sending anything if the port is
    /// closed, or if the host stops draining packets.
    pub async fn write(&mut self, data: &[u8]) -> Result<(), Disconnected> {
        if !self.is_open() {
            return Err(Disconnected);
        }
        for chunk in data.chunks(PACKET_BUFFER_SIZE) {
            match with_timeout(Duration::from_millis(WRITE_TIMEOUT_MS), self.class.write_packet(chunk)).await {
                Ok(result) => result?,
                Err(_) => return Err(Disconnected),
            }
        }
        // A full-size final packet needs a zero-length packet to end the transfer
        if data.len() % PACKET_BUFFER_SIZE == 0 && !data.is_empty() {
            match with_timeout(Duration::from_millis(WRITE_TIMEOUT_MS), self.class.write_packet(&[])).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => debug!("USB endpoint closed before the terminating zero-length packet"),
                Err(_) => debug!("Terminating zero-length packet timed out"),
            }
        }
        Ok(())
    }

    /// Return the packet that arrived within the poll window, or 0 bytes.
    ///
    /// `buffer` must hold at least [`PACKET_BUFFER_SIZE`] bytes.
    pub async fn poll_read(&mut self, buffer: &mut [u8]) -> Result<usize, Disconnected> {
        match with_timeout(Duration::from_millis(POLL_WINDOW_MS), self.class.read_packet(buffer)).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Ok(0),
        }
    }
}
