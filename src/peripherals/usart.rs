//! UART links: USART1 is the secondary host link, USART2 the downstream UART
//! of the passthrough modes.

use embassy_stm32::{
    bind_interrupts,
    mode::Async,
    peripherals::{self as stm32_peripherals, DMA1_CH2, DMA1_CH3, DMA1_CH6, DMA1_CH7, PA10, PA9, PD5, PD6, USART1, USART2},
    usart::{self, RingBufferedUartRx, Uart, UartTx},
    Peri,
};
use embassy_time::{with_timeout, Duration};
use multibridge::warn;
use static_cell::ConstStaticCell;

/// How long a poll waits for incoming bytes before giving the loop back
const POLL_WINDOW_MS: u64 = 1;

/// Size of each DMA receive ring
pub const RX_RING_SIZE: usize = 256;

bind_interrupts!(
    /// USART interrupt handlers
    pub struct UsartInterrupts {
        USART1 => usart::InterruptHandler<stm32_peripherals::USART1>;
        USART2 => usart::InterruptHandler<stm32_peripherals::USART2>;
    }
);

pub static LINK_RX_RING: ConstStaticCell<[u8; RX_RING_SIZE]> = ConstStaticCell::new([0u8; RX_RING_SIZE]);
pub static DOWNSTREAM_RX_RING: ConstStaticCell<[u8; RX_RING_SIZE]> = ConstStaticCell::new([0u8; RX_RING_SIZE]);

/// Peripheral collection for the secondary host link
pub struct LinkPeripherals<'d> {
    pub usart1: Peri<'d, USART1>,
    pub tx: Peri<'d, PA9>,
    pub rx: Peri<'d, PA10>,
    pub dma_tx: Peri<'d, DMA1_CH2>,
    pub dma_rx: Peri<'d, DMA1_CH3>,
    pub rx_ring: &'d mut [u8; RX_RING_SIZE],
}

/// Peripheral collection for the downstream UART
pub struct DownstreamPeripherals<'d> {
    pub usart2: Peri<'d, USART2>,
    pub tx: Peri<'d, PD5>,
    pub rx: Peri<'d, PD6>,
    pub dma_tx: Peri<'d, DMA1_CH6>,
    pub dma_rx: Peri<'d, DMA1_CH7>,
    pub rx_ring: &'d mut [u8; RX_RING_SIZE],
}

/// Macro to claim peripherals for the secondary host link
#[macro_export]
macro_rules! claim_link_uart {
    ($peripherals:expr) => {{
        $crate::peripherals::usart::LinkPeripherals {
            usart1: $peripherals.USART1,
            tx: $peripherals.PA9,
            rx: $peripherals.PA10,
            dma_tx: $peripherals.DMA1_CH2,
            dma_rx: $peripherals.DMA1_CH3,
            rx_ring: $crate::peripherals::usart::LINK_RX_RING.take(),
        }
    }};
}

/// Macro to claim peripherals for the downstream UART
#[macro_export]
macro_rules! claim_downstream_uart {
    ($peripherals:expr) => {{
        $crate::peripherals::usart::DownstreamPeripherals {
            usart2: $peripherals.USART2,
            tx: $peripherals.PD5,
            rx: $peripherals.PD6,
            dma_tx: $peripherals.DMA1_CH6,
            dma_rx: $peripherals.DMA1_CH7,
            rx_ring: $crate::peripherals::usart::DOWNSTREAM_RX_RING.take(),
        }
    }};
}

fn uart_config(baudrate: u32) -> usart::Config {
    let mut config = usart::Config::default();
    config.baudrate = baudrate;
    config
}

/// Full-duplex UART with a DMA receive ring, polled from the main loop.
pub struct SerialPort<'d> {
    tx: UartTx<'d, Async>,
    rx: RingBufferedUartRx<'d>,
}

impl<'d> SerialPort<'d> {
    /// USART1 on PA9/PA10 (8N1)
    pub fn link(claims: LinkPeripherals<'d>, baudrate: u32) -> Self {
        let uart = Uart::new(
            claims.usart1,
            claims.rx,
            claims.tx,
            UsartInterrupts,
            claims.dma_tx,
            claims.dma_rx,
            uart_config(baudrate),
        )
        .expect("Invalid USART1 configuration");
        Self::from_uart(uart, claims.rx_ring)
    }

    /// USART2 on PD5/PD6 (8N1)
    pub fn downstream(claims: DownstreamPeripherals<'d>, baudrate: u32) -> Self {
        let uart = Uart::new(
            claims.usart2,
            claims.rx,
            claims.tx,
            UsartInterrupts,
            claims.dma_tx,
            claims.dma_rx,
            uart_config(baudrate),
        )
        .expect("Invalid USART2 configuration");
        Self::from_uart(uart, claims.rx_ring)
    }

    fn from_uart(uart: Uart<'d, Async>, rx_ring: &'d mut [u8]) -> Self {
        let (tx, rx) = uart.split();
        Self {
            tx,
            rx: rx.into_ring_buffered(rx_ring),
        }
    }

    /// Send all of `data`.
    pub async fn write(&mut self, data: &[u8]) -> Result<(), usart::Error> {
        self.tx.write(data).await
    }

    /// Return whatever arrived within the poll window (possibly nothing).
    ///
    /// Bytes stay in the DMA ring when the window closes, so nothing is lost
    /// between polls.
    pub async fn poll_read(&mut self, buffer: &mut [u8]) -> usize {
        match with_timeout(Duration::from_millis(POLL_WINDOW_MS), self.rx.read(buffer)).await {
            Ok(Ok(count)) => count,
            Ok(Err(_)) => {
                warn!("UART receive error (overrun or framing), dropping input");
                0
            }
            Err(_) => 0,
        }
    }
}
