//! Clock tree and chip bring-up for the STM32H753.

use embassy_stm32::{rcc::*, Config, Peripherals};

/// Clock tree used by the bridge.
///
/// | Clock       | Frequency | Source                     |
/// |-------------|-----------|----------------------------|
/// | SYSCLK      | 480 MHz   | PLL1_P from HSI (16 MHz)   |
/// | AHB         | 240 MHz   | SYSCLK / 2                 |
/// | APB1..APB4  | 120 MHz   | AHB / 2                    |
/// | USB         | 48 MHz    | HSI48, trimmed by USB SOF  |
///
/// The SPI4 and I2C1 kernel clocks come from their APB bus (120 MHz), so the
/// configured bus frequencies are reached by the peripherals' own dividers.
pub fn clock_config() -> Config {
    let mut config = Config::default();

    config.rcc.hsi = Some(HSIPrescaler::DIV1);
    config.rcc.csi = true;
    config.rcc.hsi48 = Some(Hsi48Config { sync_from_usb: true });

    // 16 MHz / 4 * 60 / 2 = 480 MHz
    config.rcc.pll1 = Some(Pll {
        source: PllSource::HSI,
        prediv: PllPreDiv::DIV4,
        mul: PllMul::MUL60,
        divp: Some(PllDiv::DIV2),
        divq: None,
        divr: None,
    });

    config.rcc.sys = Sysclk::PLL1_P;
    config.rcc.ahb_pre = AHBPrescaler::DIV2;
    config.rcc.apb1_pre = APBPrescaler::DIV2;
    config.rcc.apb2_pre = APBPrescaler::DIV2;
    config.rcc.apb3_pre = APBPrescaler::DIV2;
    config.rcc.apb4_pre = APBPrescaler::DIV2;

    // 480 MHz needs VOS0
    config.rcc.voltage_scale = VoltageScale::Scale0;
    config.rcc.mux.usbsel = mux::Usbsel::HSI48;

    config
}

/// Apply [`clock_config`] and take ownership of the chip peripherals.
///
/// # Panics
///
/// Panics if the clock tree cannot be brought up (PLL never locks).
pub fn init_system() -> Peripherals {
    embassy_stm32::init(clock_config())
}
