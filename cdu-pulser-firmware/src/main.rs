//! CDU Pulser - Turnout Decoder Firmware
//!
//! Main firmware binary for RP2040-based turnout decoders. Turnout motors
//! hang off a relay board fed by a capacitor discharge unit; the firmware
//! fires one relay at a time and lets the CDU recharge between pulses.
//!
//! Pin assignments:
//! - UART0 (GPIO0 TX, GPIO1 RX): host link
//! - I2C0 (GPIO4 SDA, GPIO5 SCL): Relay16 board
//! - GPIO6..GPIO13: directly wired relays (`kind = "gpio"`)

#![no_std]
#![no_main]

use cdu_pulser_core::config::BoardKind;
use cdu_pulser_core::traits::Level;
use cdu_pulser_drivers::{GpioRelayBank, HalI2c, HalPin, Relay16};
use cdu_pulser_hal::I2cConfig;
use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{self, Output};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Timer;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::board::Board;
use crate::tasks::Sequencer;

mod board;
mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 128]> = StaticCell::new();

/// Delay between attempts to bring up an unresponsive relay board
const BOARD_RETRY_SECS: u64 = 1;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("CDU pulser firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let settings = config::load_settings();
    let inactive = settings.pulser.inactive_level();

    let mut board = match settings.board.kind {
        BoardKind::Relay16 => {
            let mut i2c_config = i2c::Config::default();
            i2c_config.frequency = I2cConfig::STANDARD.frequency;
            let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);

            let relays = Relay16::from_config(HalI2c::new(i2c), &settings.board);
            info!("Relay16 board at 0x{:02x}", relays.address());
            Board::Relay16(relays)
        }
        BoardKind::Gpio => {
            let level = pin_level(inactive);
            let pins = [
                HalPin::new(Output::new(p.PIN_6, level), inactive),
                HalPin::new(Output::new(p.PIN_7, level), inactive),
                HalPin::new(Output::new(p.PIN_8, level), inactive),
                HalPin::new(Output::new(p.PIN_9, level), inactive),
                HalPin::new(Output::new(p.PIN_10, level), inactive),
                HalPin::new(Output::new(p.PIN_11, level), inactive),
                HalPin::new(Output::new(p.PIN_12, level), inactive),
                HalPin::new(Output::new(p.PIN_13, level), inactive),
            ];

            // Validation caps channels at the pins wired above
            Board::Gpio {
                bank: GpioRelayBank::new(pins),
                channels: settings.board.channels,
            }
        }
    };

    // Nothing may fire until every relay is known to be released
    while let Err(e) = board.init(inactive) {
        error!("Relay board not responding: {}", e);
        Timer::after_secs(BOARD_RETRY_SECS).await;
    }
    info!("Relay board initialized");

    let sequencer = match Sequencer::new(board, settings.pulser) {
        Ok(sequencer) => sequencer,
        Err(e) => defmt::panic!("Relay board failed after init: {}", e),
    };

    // Setup UART for the host link
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 64]);
    let rx_buf = RX_BUF.init([0u8; 128]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized for host link");

    spawner.spawn(tasks::pulser_task(sequencer)).unwrap();
    spawner
        .spawn(tasks::host_rx_task(rx, settings.turnouts))
        .unwrap();
    spawner.spawn(tasks::host_tx_task(tx)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

fn pin_level(level: Level) -> gpio::Level {
    if level.is_high() {
        gpio::Level::High
    } else {
        gpio::Level::Low
    }
}
