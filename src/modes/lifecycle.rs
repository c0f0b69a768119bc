//! Mode lifecycle state machine.
//!
//! The selection itself is a plain value ([`ModeState`]) with a pure
//! transition, so it can be reasoned about without hardware. The effects of a
//! transition (tear down the old mode, set up the new one, update the status
//! display) are driven by [`ModeController`] through the [`ModeHandler`] and
//! [`StatusDisplay`] seams.

use super::registry::{AxisCursor, Bus, Mode, ModeAxis};
use crate::config::BridgeConfig;
use crate::input::ModeButtons;

/// Which axis is active and where each axis cursor points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeState {
    active: ModeAxis,
    host: AxisCursor,
    downstream: AxisCursor,
}

impl ModeState {
    /// Power-on selection: USB host link bridged to the downstream UART.
    pub const BOOT: Self = Self {
        active: ModeAxis::HostInterface,
        host: AxisCursor::FIRST,
        downstream: AxisCursor::FIRST,
    };

    pub const fn new(active: ModeAxis, host: AxisCursor, downstream: AxisCursor) -> Self {
        Self {
            active,
            host,
            downstream,
        }
    }

    pub const fn active_axis(&self) -> ModeAxis {
        self.active
    }

    pub const fn cursor(&self, axis: ModeAxis) -> AxisCursor {
        match axis {
            ModeAxis::HostInterface => self.host,
            ModeAxis::DownstreamBridge => self.downstream,
        }
    }

    /// Selected mode, or `None` if the active cursor is corrupted.
    pub fn active_mode(&self) -> Option<Mode> {
        let axis = self.active;
        self.cursor(axis).mode(axis).map(|bus| Mode { axis, bus })
    }

    /// State after a button press on `axis`: that axis becomes active and
    /// moves to its next mode. The other axis keeps its position.
    #[must_use]
    pub fn on_press(self, axis: ModeAxis) -> Self {
        let cursor = self.cursor(axis).next(axis);
        Self {
            active: axis,
            ..self.with_cursor(axis, cursor)
        }
    }

    #[must_use]
    fn with_cursor(self, axis: ModeAxis, cursor: AxisCursor) -> Self {
        match axis {
            ModeAxis::HostInterface => Self { host: cursor, ..self },
            ModeAxis::DownstreamBridge => Self {
                downstream: cursor,
                ..self
            },
        }
    }
}

impl Default for ModeState {
    fn default() -> Self {
        Self::BOOT
    }
}

/// Per-mode behaviour, implemented by the firmware for the real buses.
///
/// `setup` runs exactly once when a mode becomes active, `service` on every
/// main-loop iteration while it stays active, and `teardown` once when it is
/// switched away. Faults are handled inside the handler (reported, then
/// degraded operation); the controller never retries.
#[allow(async_fn_in_trait)]
pub trait ModeHandler {
    async fn setup(&mut self, mode: Mode);
    async fn service(&mut self, mode: Mode);
    async fn teardown(&mut self, mode: Mode);
}

/// Status display collaborator, told about every mode activation.
pub trait StatusDisplay {
    fn show(&mut self, label_a: &str, label_b: &str, parameter: u32);
}

/// Numeric parameter shown next to a mode's labels.
pub fn status_parameter(mode: Mode, config: &BridgeConfig) -> u32 {
    match (mode.axis, mode.bus) {
        (_, Bus::Uart) => config.uart_baudrate,
        (_, Bus::I2c) => config.i2c_frequency,
        (_, Bus::Spi) => config.spi_frequency,
        (ModeAxis::HostInterface, Bus::OneWire) => config.onewire_speed,
        (ModeAxis::DownstreamBridge, Bus::OneWire) => config.uart_baudrate,
    }
}

/// Owns the mode selection and drives mode transitions.
pub struct ModeController<H, S> {
    state: ModeState,
    /// Mode whose `setup` has run and whose `teardown` has not
    active: Option<Mode>,
    handler: H,
    display: S,
    config: BridgeConfig,
}

impl<H: ModeHandler, S: StatusDisplay> ModeController<H, S> {
    /// Create a controller in the boot state. Nothing is set up until
    /// [`start`](Self::start) is awaited.
    pub fn new(handler: H, display: S, config: BridgeConfig) -> Self {
        Self::with_state(ModeState::BOOT, handler, display, config)
    }

    pub fn with_state(state: ModeState, handler: H, display: S, config: BridgeConfig) -> Self {
        Self {
            state,
            active: None,
            handler,
            display,
            config,
        }
    }

    pub fn state(&self) -> ModeState {
        self.state
    }

    pub fn active_mode(&self) -> Option<Mode> {
        self.active
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn display(&self) -> &S {
        &self.display
    }

    /// Activate the mode selected by the current state.
    pub async fn start(&mut self) {
        self.activate().await;
    }

    /// Handle one consumed button press on `axis`.
    pub async fn advance(&mut self, axis: ModeAxis) {
        self.state = self.state.on_press(axis);
        self.activate().await;
    }

    /// Run the active mode's periodic work once.
    pub async fn service(&mut self) {
        if let Some(mode) = self.active {
            self.handler.service(mode).await;
        }
    }

    /// One main-loop iteration: consume both buttons, then service the
    /// active mode.
    pub async fn step(&mut self, buttons: ModeButtons<'_>) {
        if buttons.host.consume() {
            self.advance(ModeAxis::HostInterface).await;
        }
        if buttons.downstream.consume() {
            self.advance(ModeAxis::DownstreamBridge).await;
        }
        self.service().await;
    }

    async fn activate(&mut self) {
        if let Some(previous) = self.active.take() {
            debug!("Tearing down {} <-> {}", previous.axis.label(), previous.bus.label());
            self.handler.teardown(previous).await;
        }

        let mode = self.resolve();
        info!(
            "Mode {} <-> {} ({}), cursor {}",
            mode.axis.label(),
            mode.bus.label(),
            mode.bus.device(),
            self.state.cursor(mode.axis).index()
        );

        self.handler.setup(mode).await;
        self.display.show(
            mode.axis.label(),
            mode.bus.label(),
            status_parameter(mode, &self.config),
        );
        self.active = Some(mode);
    }

    /// Selected mode, resetting a corrupted axis to its first mode.
    fn resolve(&mut self) -> Mode {
        match self.state.active_mode() {
            Some(mode) => mode,
            None => {
                let axis = self.state.active_axis();
                warn!(
                    "Invalid mode index {} on {} axis, resetting to first mode",
                    self.state.cursor(axis).index(),
                    axis.label()
                );
                self.state = self.state.with_cursor(axis, AxisCursor::FIRST);
                self.resolve()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ButtonChannel;
    use embassy_futures::block_on;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Call {
        Setup(Mode),
        Service(Mode),
        Teardown(Mode),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl ModeHandler for Recorder {
        async fn setup(&mut self, mode: Mode) {
            self.calls.push(Call::Setup(mode));
        }

        async fn service(&mut self, mode: Mode) {
            self.calls.push(Call::Service(mode));
        }

        async fn teardown(&mut self, mode: Mode) {
            self.calls.push(Call::Teardown(mode));
        }
    }

    #[derive(Default)]
    struct Screen {
        shown: Vec<(String, String, u32)>,
    }

    impl StatusDisplay for Screen {
        fn show(&mut self, label_a: &str, label_b: &str, parameter: u32) {
            self.shown.push((label_a.into(), label_b.into(), parameter));
        }
    }

    fn mode(axis: ModeAxis, bus: Bus) -> Mode {
        Mode { axis, bus }
    }

    fn controller() -> ModeController<Recorder, Screen> {
        ModeController::new(Recorder::default(), Screen::default(), BridgeConfig::DEFAULT)
    }

    #[test]
    fn press_advances_only_its_axis() {
        let state = ModeState::BOOT.on_press(ModeAxis::DownstreamBridge);
        assert_eq!(state.active_axis(), ModeAxis::DownstreamBridge);
        assert_eq!(state.cursor(ModeAxis::DownstreamBridge).index(), 1);
        assert_eq!(state.cursor(ModeAxis::HostInterface).index(), 0);
        assert_eq!(
            state.active_mode(),
            Some(mode(ModeAxis::DownstreamBridge, Bus::I2c))
        );

        // Back to the host axis: it resumes after its own last mode
        let state = state.on_press(ModeAxis::HostInterface);
        assert_eq!(state.active_mode(), Some(mode(ModeAxis::HostInterface, Bus::I2c)));
        assert_eq!(state.cursor(ModeAxis::DownstreamBridge).index(), 1);
    }

    #[test]
    fn start_sets_up_boot_mode_once() {
        let mut ctl = controller();
        block_on(ctl.start());
        let boot = mode(ModeAxis::HostInterface, Bus::Uart);
        assert_eq!(ctl.active_mode(), Some(boot));
        assert_eq!(ctl.handler().calls, vec![Call::Setup(boot)]);
        assert_eq!(ctl.display().shown, vec![("USB".into(), "UART".into(), 115_200)]);
    }

    #[test]
    fn transition_tears_down_then_sets_up() {
        let mut ctl = controller();
        block_on(async {
            ctl.start().await;
            ctl.service().await;
            ctl.advance(ModeAxis::HostInterface).await;
            ctl.service().await;
            ctl.service().await;
        });

        let uart = mode(ModeAxis::HostInterface, Bus::Uart);
        let i2c = mode(ModeAxis::HostInterface, Bus::I2c);
        assert_eq!(
            ctl.handler().calls,
            vec![
                Call::Setup(uart),
                Call::Service(uart),
                Call::Teardown(uart),
                Call::Setup(i2c),
                Call::Service(i2c),
                Call::Service(i2c),
            ]
        );
    }

    #[test]
    fn step_consumes_buttons_and_services() {
        let host = ButtonChannel::new(100);
        let downstream = ButtonChannel::new(100);
        let buttons = ModeButtons {
            host: &host,
            downstream: &downstream,
        };
        let mut ctl = controller();

        block_on(ctl.start());
        downstream.on_edge(1_000);
        block_on(ctl.step(buttons));
        // Flag is cleared: the next iteration only services
        block_on(ctl.step(buttons));

        let boot = mode(ModeAxis::HostInterface, Bus::Uart);
        let bridge_i2c = mode(ModeAxis::DownstreamBridge, Bus::I2c);
        assert_eq!(
            ctl.handler().calls,
            vec![
                Call::Setup(boot),
                Call::Teardown(boot),
                Call::Setup(bridge_i2c),
                Call::Service(bridge_i2c),
                Call::Service(bridge_i2c),
            ]
        );
    }

    #[test]
    fn both_buttons_in_one_iteration_end_on_downstream_axis() {
        let host = ButtonChannel::new(100);
        let downstream = ButtonChannel::new(100);
        let mut ctl = controller();
        block_on(ctl.start());

        host.on_edge(1_000);
        downstream.on_edge(1_000);
        block_on(ctl.step(ModeButtons {
            host: &host,
            downstream: &downstream,
        }));

        assert_eq!(
            ctl.active_mode(),
            Some(mode(ModeAxis::DownstreamBridge, Bus::I2c))
        );
        let setups = ctl
            .handler()
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Setup(_)))
            .count();
        assert_eq!(setups, 3);
    }

    #[test]
    fn full_cycle_wraps_to_first_mode() {
        let mut ctl = controller();
        block_on(async {
            ctl.start().await;
            for _ in 0..ModeAxis::HostInterface.count() {
                ctl.advance(ModeAxis::HostInterface).await;
            }
        });
        assert_eq!(ctl.state(), ModeState::BOOT);
        assert_eq!(ctl.display().shown.len(), 5);
        assert_eq!(ctl.display().shown[3], ("USB".into(), "1-Wire".into(), 16_300));
    }

    #[test]
    fn corrupted_cursor_resets_to_first_mode() {
        let state = ModeState::new(
            ModeAxis::DownstreamBridge,
            AxisCursor::FIRST,
            AxisCursor::from_raw(9),
        );
        let mut ctl = ModeController::with_state(
            state,
            Recorder::default(),
            Screen::default(),
            BridgeConfig::DEFAULT,
        );
        block_on(ctl.start());

        let first = mode(ModeAxis::DownstreamBridge, Bus::Uart);
        assert_eq!(ctl.active_mode(), Some(first));
        assert_eq!(ctl.state().cursor(ModeAxis::DownstreamBridge), AxisCursor::FIRST);
        assert_eq!(ctl.handler().calls, vec![Call::Setup(first)]);
    }

    #[test]
    fn service_before_start_does_nothing() {
        let mut ctl = controller();
        block_on(ctl.service());
        assert!(ctl.handler().calls.is_empty());
    }

    #[test]
    fn status_parameters() {
        let config = BridgeConfig::DEFAULT;
        let check = |axis, bus| status_parameter(mode(axis, bus), &config);
        assert_eq!(check(ModeAxis::DownstreamBridge, Bus::Spi), 1_000_000);
        assert_eq!(check(ModeAxis::DownstreamBridge, Bus::OneWire), 115_200);
        assert_eq!(check(ModeAxis::HostInterface, Bus::OneWire), 16_300);
        assert_eq!(check(ModeAxis::HostInterface, Bus::I2c), 400_000);
    }
}
