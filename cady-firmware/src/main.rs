//! Cady - SBC Power Supervisor Firmware
//!
//! RP2040 firmware that sequences power for a companion single-board
//! computer. It serves a Modbus RTU register map to the SBC, watches the
//! SBC's heartbeat counter, mediates shutdown from the front-panel button
//! and drives the joystick rails, joystick LEDs and display power key.
//!
//! Task layout:
//! - poll task (high-priority interrupt executor): Modbus, heartbeat,
//!   lifecycle state machine, light effects
//! - PWM task (highest-priority interrupt executor): joystick LED PWM
//! - display task (thread-mode executor): display power supervision

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use cady_core::config::SelectorKind;
use cady_drivers::{AnySelector, Button, DipSelector, EncoderSelector, PowerSwitch};
use cady_hal::HalPin;

use crate::board::{DisplayResources, LightResources, PollResources, DIP_PINS};

mod board;
mod config;
mod context;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

static EXECUTOR_PWM: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_POLL: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_0() {
    EXECUTOR_PWM.on_interrupt()
}

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_POLL.on_interrupt()
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Cady firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let ctx = context::init(config::load_config());
    let config = &ctx.config;
    config::log_config_summary(config);

    // Modbus link to the SBC
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.modbus.baud_rate;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);

    info!("UART initialized for Modbus");

    // Power rails start off: an active-low rail idles high
    let power = &config.power;
    let sbc = PowerSwitch::new(
        HalPin::new(Output::new(p.PIN_2, Level::from(power.sbc_active_low))),
        power.sbc_active_low,
    );
    let joy1 = PowerSwitch::new(
        HalPin::new(Output::new(p.PIN_8, Level::from(power.joy_active_low))),
        power.joy_active_low,
    );
    let joy2 = PowerSwitch::new(
        HalPin::new(Output::new(p.PIN_9, Level::from(power.joy_active_low))),
        power.joy_active_low,
    );

    let button = Button::new(HalPin::new(Input::new(p.PIN_3, Pull::Up)), &config.button);

    let apply = HalPin::new(Input::new(p.PIN_10, Pull::Up));
    let selector = match config.selector.kind {
        SelectorKind::Encoder => AnySelector::Encoder(EncoderSelector::new(
            HalPin::new(Input::new(p.PIN_11, Pull::Up)),
            HalPin::new(Input::new(p.PIN_12, Pull::Up)),
            apply,
            &config.selector,
        )),
        SelectorKind::Dip => {
            let bits = [
                Input::new(p.PIN_13, Pull::Up),
                Input::new(p.PIN_14, Pull::Up),
                Input::new(p.PIN_15, Pull::Up),
                Input::new(p.PIN_16, Pull::Up),
            ];
            let wired = (config.selector.dip_pins as usize).min(DIP_PINS);
            AnySelector::Dip(DipSelector::new(
                bits.into_iter().take(wired).map(HalPin::new),
                apply,
                &config.selector,
            ))
        }
    };

    info!("Power, button and selector initialized");

    // Display key starts released
    let display = DisplayResources {
        control: Output::new(p.PIN_4, Level::from(config.display.control_inverted)),
        detect: Input::new(p.PIN_5, Pull::None),
    };

    let lights = LightResources {
        leds: [
            Output::new(p.PIN_6, Level::Low),
            Output::new(p.PIN_7, Level::Low),
        ],
    };

    let poll = PollResources {
        uart,
        sbc,
        joy1,
        joy2,
        button,
        selector,
    };

    // Spawn tasks
    interrupt::SWI_IRQ_0.set_priority(Priority::P1);
    let pwm_spawner = EXECUTOR_PWM.start(interrupt::SWI_IRQ_0);
    pwm_spawner.spawn(tasks::pwm_task(ctx, lights)).unwrap();

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let poll_spawner = EXECUTOR_POLL.start(interrupt::SWI_IRQ_1);
    poll_spawner.spawn(tasks::poll_task(ctx, poll)).unwrap();

    spawner.spawn(tasks::display_task(ctx, display)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
