//! CO2 monitor firmware
//!
//! Main firmware binary for RP2040 boards carrying an SCD30 CO2 sensor,
//! a BMP280 pressure sensor and an SSD1306 OLED on one I2C bus.
//!
//! Wiring:
//! - I2C0: GP4 (SDA), GP5 (SCL), 100 kHz
//! - UART0 TX: GP0, log console at 115200 baud

#![no_std]
#![no_main]

use core::cell::RefCell;

use embassy_executor::Spawner;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::I2C0;
use embassy_rp::uart::{self, UartTx};
use embassy_time::{Delay, Timer};
use embedded_hal_bus::i2c::RefCellDevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use co2meter_core::app::Monitor;
use co2meter_core::log::Logger;
use co2meter_core::{log_error, log_info};
use co2meter_drivers::display::Ssd1306;
use co2meter_drivers::sensor::{Bmp280, Scd30, Scd30Config};
use co2meter_hal::{I2cConfig, CONSOLE_BAUDRATE};
use co2meter_hal_rp2040::clock::EmbassyClock;
use co2meter_hal_rp2040::flash::Rp2040FlashStorage;
use co2meter_hal_rp2040::uart::ConsoleUart;

use crate::config::DEVICE_CONFIG;
use crate::console::Console;

mod config;
mod console;

/// How often a halted device wakes up; nothing happens when it does
const HALT_PARK_SECS: u64 = 60;

// Shared sensor bus (must live forever for the bus devices)
static I2C_BUS: StaticCell<RefCell<I2c<'static, I2C0, i2c::Blocking>>> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    // Log console on UART0
    let mut uart_config = uart::Config::default();
    uart_config.baudrate = CONSOLE_BAUDRATE;
    let tx = UartTx::new_blocking(p.UART0, p.PIN_0, uart_config);
    let mut log = Logger::new(Console::new(ConsoleUart::new(tx)), DEVICE_CONFIG.log_level);
    log_info!(&mut log, "CO2 monitor firmware starting");

    // Sensor bus on I2C0, shared by all three devices
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2cConfig::STANDARD.frequency;
    let bus: &'static RefCell<_> = I2C_BUS.init(RefCell::new(I2c::new_blocking(
        p.I2C0,
        p.PIN_5,
        p.PIN_4,
        i2c_config,
    )));

    #[cfg(feature = "i2c-scan")]
    co2meter_core::diagnostics::scan(&mut RefCellDevice::new(bus), &mut log);

    let co2 = Scd30::new(RefCellDevice::new(bus), Delay, Scd30Config::default());
    let pressure = Bmp280::new(RefCellDevice::new(bus), Delay);
    let display = Ssd1306::new(RefCellDevice::new(bus), DEVICE_CONFIG.display_address);
    let storage = Rp2040FlashStorage::new(p.FLASH, p.DMA_CH0);

    let mut monitor = Monitor::new(
        co2,
        pressure,
        storage,
        display,
        EmbassyClock,
        log,
        DEVICE_CONFIG,
    );
    let mut delay = Delay;

    #[cfg(feature = "reset-calibration")]
    if let Err(e) = monitor.reset_calibration().await {
        co2meter_core::log_warn!(monitor.log_mut(), "Calibration reset not persisted: {:?}", e);
    }

    if let Err(e) = monitor.start(&mut delay).await {
        log_error!(monitor.log_mut(), "Halted: {:?}", e);
        loop {
            Timer::after_secs(HALT_PARK_SECS).await;
        }
    }

    #[cfg(feature = "display-check")]
    monitor.run_display_check(&mut delay).await;

    monitor.run(&mut delay).await
}
