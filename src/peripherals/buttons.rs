//! Mode buttons on EXTI lines.
//!
//! Each button gets its own task that waits for falling edges and feeds the
//! debounced [`ButtonChannel`]. The main loop consumes the pending presses.

use embassy_stm32::{
    exti::ExtiInput,
    gpio::Pull,
    peripherals::{EXTI2, EXTI3, PE2, PE3},
    Peri,
};
use embassy_time::Instant;
use multibridge::{debug, BridgeConfig, ButtonChannel, ModeAxis};

/// Press on the host-interface axis (USB family)
pub static HOST_BUTTON: ButtonChannel = ButtonChannel::new(BridgeConfig::DEFAULT.debounce_ms);
/// Press on the downstream-bridge axis (UART family)
pub static DOWNSTREAM_BUTTON: ButtonChannel = ButtonChannel::new(BridgeConfig::DEFAULT.debounce_ms);

/// Peripheral collection for both mode buttons
pub struct ButtonPeripherals<'d> {
    pub host_pin: Peri<'d, PE2>,
    pub host_line: Peri<'d, EXTI2>,
    pub downstream_pin: Peri<'d, PE3>,
    pub downstream_line: Peri<'d, EXTI3>,
}

/// Macro to claim peripherals for the mode buttons
#[macro_export]
macro_rules! claim_buttons {
    ($peripherals:expr) => {{
        $crate::peripherals::buttons::ButtonPeripherals {
            host_pin: $peripherals.PE2,
            host_line: $peripherals.EXTI2,
            downstream_pin: $peripherals.PE3,
            downstream_line: $peripherals.EXTI3,
        }
    }};
}

/// Buttons are active low with the internal pull-up enabled.
pub fn split(claims: ButtonPeripherals<'_>) -> (ExtiInput<'_>, ExtiInput<'_>) {
    (
        ExtiInput::new(claims.host_pin, claims.host_line, Pull::Up),
        ExtiInput::new(claims.downstream_pin, claims.downstream_line, Pull::Up),
    )
}

/// Edge task for one button, spawned once per axis
#[embassy_executor::task(pool_size = 2)]
pub async fn task(mut input: ExtiInput<'static>, axis: ModeAxis, channel: &'static ButtonChannel) -> ! {
    loop {
        input.wait_for_falling_edge().await;
        // Millisecond clock wraps after ~49 days; the debounce compare is wrapping
        let now_ms = Instant::now().as_millis() as u32;
        if channel.on_edge(now_ms) {
            debug!("{} button press at {} ms", axis.label(), now_ms);
        }
    }
}
