//! Poll task
//!
//! The real-time loop of the supervisor. Every poll interval it:
//!
//! 1. services the Modbus link until the line is quiet for the read timeout,
//! 2. exchanges registers with the shared store and checks the heartbeat,
//! 3. samples the button and the game selector,
//! 4. ticks the lifecycle controller and publishes its writes,
//! 5. advances the light effect and hands the duties to the PWM task.

use defmt::*;
use embassy_rp::uart::BufferedUart;
use embassy_time::{with_timeout, Delay, Duration, Instant, Ticker};
use embedded_io_async::{Read, Write};

use cady_core::config::BoardConfig;
use cady_core::heartbeat::HeartbeatEvent;
use cady_core::lifecycle::{Actuators, LifecycleController, TickInputs, Transition};
use cady_core::state::ErrorKind;
use cady_core::traits::ForceOffLatch;
use cady_core::transport::{RegisterTransport, ReplyBuffer, RxOutcome};
use cady_drivers::LightEffects;

use super::now_ms;
use crate::board::{PollResources, Switch};
use crate::context::Context;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

type Controller = LifecycleController<Switch, LightEffects, ForceOffLatch>;

/// Poll task - runs on the high-priority interrupt executor
#[embassy_executor::task]
pub async fn poll_task(ctx: &'static Context, res: PollResources) {
    info!("Poll task started");

    let config = &ctx.config;
    let PollResources {
        mut uart,
        sbc,
        joy1,
        joy2,
        mut button,
        mut selector,
    } = res;

    let mut client = ctx
        .store
        .client(Delay)
        .with_wait(config.lifecycle.lock_wait_ms);
    let mut transport = RegisterTransport::new(&config.modbus, &config.heartbeat);
    let actuators = Actuators {
        sbc,
        joy1,
        joy2,
        lights: LightEffects::new(&config.lights),
        display: ForceOffLatch::new(),
    };
    let mut controller = Controller::new(actuators, config.lifecycle, now_ms());
    info!(
        "Lifecycle started in {:?}, Modbus slave {}",
        controller.state(),
        transport.address()
    );

    let poll_interval = Duration::from_millis(config.lifecycle.poll_interval_ms as u64);
    let read_timeout = Duration::from_millis(config.modbus.read_timeout_ms as u64);
    let mut ticker = Ticker::every(poll_interval);
    let mut reply = ReplyBuffer::new();

    loop {
        ticker.next().await;

        let deadline = Instant::now() + poll_interval;
        service_bus(&mut uart, &mut transport, &mut reply, read_timeout, deadline).await;

        let now = now_ms();
        let report = transport.exchange(&mut client, now).await;
        if !report.published {
            trace!("Store busy, registers not published");
        }
        if let Some(event) = report.heartbeat {
            log_heartbeat(event);
        }

        button.update(now);
        if let Some(value) = selector.update(now) {
            info!("Game selection applied: {}", value);
        }

        let inputs = TickInputs::sample(
            &mut button,
            &selector,
            transport.connected(),
            client.cached(),
            now,
        );
        let outcome = controller.tick(&inputs);
        if let Some(transition) = outcome.transition {
            log_transition(&transition, config);
        }

        let writes = outcome.writes;
        if writes.clear_shutdown_flag {
            transport.clear_shutdown_flag();
        }
        if !client.update(|state| writes.apply(state)).await {
            trace!("Store busy, lifecycle writes dropped");
        }

        let (joy1_duty, joy2_duty) = controller.actuators_mut().lights.update(now);
        ctx.duties.set(0, joy1_duty);
        ctx.duties.set(1, joy2_duty);
    }
}

/// Feed received bytes to the transport and answer complete requests
///
/// Reads until the line stays quiet for `read_timeout` or `deadline`
/// passes, so a chattering master cannot stall the lifecycle.
async fn service_bus(
    uart: &mut BufferedUart,
    transport: &mut RegisterTransport,
    reply: &mut ReplyBuffer,
    read_timeout: Duration,
    deadline: Instant,
) {
    let mut buf = [0u8; RX_BUF_SIZE];

    while Instant::now() < deadline {
        let n = match with_timeout(read_timeout, uart.read(&mut buf)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                warn!("UART read error: {:?}", e);
                break;
            }
            // Line quiet
            Err(_) => break,
        };

        trace!("RX: {} bytes", n);
        let now = now_ms();
        for &byte in &buf[..n] {
            let outcome = transport.receive(byte, now, reply);
            respond(uart, outcome, reply).await;
        }
    }

    let outcome = transport.poll_receiver(now_ms(), reply);
    respond(uart, outcome, reply).await;
}

async fn respond(uart: &mut BufferedUart, outcome: RxOutcome, reply: &ReplyBuffer) {
    match outcome {
        RxOutcome::Pending | RxOutcome::Ignored => {}
        RxOutcome::Replied { function } => {
            trace!("Function {=u8:#x}: {} byte reply", function, reply.len());
            if let Err(e) = uart.write_all(reply).await {
                warn!("UART write error: {:?}", e);
                return;
            }
            if let Err(e) = uart.flush().await {
                warn!("UART flush error: {:?}", e);
            }
        }
        RxOutcome::Executed { function } => {
            trace!("Broadcast function {=u8:#x} executed", function);
        }
        RxOutcome::Dropped(e) => {
            warn!("Dropped Modbus frame: {:?}", e);
        }
    }
}

fn log_heartbeat(event: HeartbeatEvent) {
    match event {
        HeartbeatEvent::Alive { counter } => debug!("SBC heartbeat {}", counter),
        HeartbeatEvent::Restored { counter } => info!("SBC heartbeat restored at {}", counter),
        HeartbeatEvent::Stale { retries } => debug!("SBC heartbeat stale for {} checks", retries),
        HeartbeatEvent::Lost => warn!("SBC heartbeat lost"),
        HeartbeatEvent::Waiting => trace!("Waiting for SBC heartbeat"),
    }
}

fn log_transition(transition: &Transition, config: &BoardConfig) {
    let Transition {
        from, to, cause, ..
    } = *transition;

    match cause {
        Some(ErrorKind::BootTimeout) => error!(
            "{:?} -> {:?}: no SBC heartbeat within {}ms",
            from, to, config.lifecycle.boot_timeout_ms
        ),
        Some(ErrorKind::ConnectionLost) => {
            error!("{:?} -> {:?}: SBC connection lost", from, to)
        }
        None if transition.forced => warn!("{:?} -> {:?}: long press", from, to),
        None => info!("{:?} -> {:?}", from, to),
    }
}
