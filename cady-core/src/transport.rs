//! Register transport
//!
//! Bridges the Modbus register bank and the shared state store. Once per
//! poll cycle the firmware feeds received bytes through [`RegisterTransport::receive`]
//! and then calls [`RegisterTransport::exchange`], which:
//!
//! 1. publishes the SBC-written coils and holding registers to the store,
//! 2. publishes the MCU-owned store fields to the read-only banks,
//! 3. runs the gated heartbeat check,
//! 4. increments the MCU heartbeat counter.
//!
//! The transport owns the heartbeat monitor; [`RegisterTransport::connected`]
//! is the lifecycle controller's only view of SBC liveness.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use cady_protocol::map::{coil, discrete, holding, input};
use cady_protocol::{Dispatch, Frame, FrameError, FrameReceiver, Slave, SupervisorBank};

use crate::config::{HeartbeatConfig, ModbusConfig};
use crate::heartbeat::{CheckTimer, HeartbeatEvent, HeartbeatMonitor};
use crate::shared::StoreClient;

pub use cady_protocol::MAX_FRAME_SIZE;

/// Reply bytes ready for the serial port
pub type ReplyBuffer = Vec<u8, MAX_FRAME_SIZE>;

/// What happened to one received byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxOutcome {
    /// Frame still incomplete
    Pending,
    /// Request answered; reply buffer holds the response
    Replied { function: u8 },
    /// Broadcast executed without reply
    Executed { function: u8 },
    /// Frame for another slave
    Ignored,
    /// Frame dropped by the receiver
    Dropped(FrameError),
}

/// Result of one exchange with the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Heartbeat check outcome, when the check was due this cycle
    pub heartbeat: Option<HeartbeatEvent>,
    /// Bank values reached the store
    pub published: bool,
    /// MCU heartbeat counter after this cycle
    pub mcu_counter: u16,
}

/// Register exchange and heartbeat owner
pub struct RegisterTransport {
    slave: Slave,
    receiver: FrameReceiver,
    bank: SupervisorBank,
    heartbeat: HeartbeatMonitor,
    check_timer: CheckTimer,
    mcu_counter: u16,
}

impl RegisterTransport {
    /// Create a transport with a cleared bank and a disconnected monitor
    pub fn new(modbus: &ModbusConfig, heartbeat: &HeartbeatConfig) -> Self {
        Self {
            slave: Slave::new(modbus.slave_address),
            receiver: FrameReceiver::with_gap(modbus.inter_frame_gap_ms),
            bank: SupervisorBank::new(),
            heartbeat: HeartbeatMonitor::new(heartbeat.max_retries),
            check_timer: CheckTimer::new(heartbeat.period_ms),
            mcu_counter: 0,
        }
    }

    /// Feed one received byte
    ///
    /// When a complete request for this slave arrives, the encoded response
    /// is written to `reply` and [`RxOutcome::Replied`] is returned.
    pub fn receive(&mut self, byte: u8, now_ms: u32, reply: &mut ReplyBuffer) -> RxOutcome {
        let result = self.receiver.feed(byte, now_ms);
        self.dispatch(result, reply)
    }

    /// Complete or drop a pending frame once the line has gone quiet
    pub fn poll_receiver(&mut self, now_ms: u32, reply: &mut ReplyBuffer) -> RxOutcome {
        let result = self.receiver.poll(now_ms);
        self.dispatch(result, reply)
    }

    fn dispatch(
        &mut self,
        result: Result<Option<Frame>, FrameError>,
        reply: &mut ReplyBuffer,
    ) -> RxOutcome {
        let frame = match result {
            Ok(Some(frame)) => frame,
            Ok(None) => return RxOutcome::Pending,
            Err(e) => return RxOutcome::Dropped(e),
        };

        match self.slave.handle(&mut self.bank, &frame) {
            Dispatch::Respond(response) => {
                reply.clear();
                let mut buffer = [0u8; MAX_FRAME_SIZE];
                match response.encode(&mut buffer) {
                    Ok(len) if reply.extend_from_slice(&buffer[..len]).is_ok() => {
                        RxOutcome::Replied {
                            function: frame.function,
                        }
                    }
                    _ => RxOutcome::Dropped(FrameError::BufferTooSmall),
                }
            }
            Dispatch::Executed => RxOutcome::Executed {
                function: frame.function,
            },
            Dispatch::Ignored => RxOutcome::Ignored,
        }
    }

    /// Synchronize the bank with the store and run the periodic checks
    pub async fn exchange<M: RawMutex, D: DelayNs>(
        &mut self,
        client: &mut StoreClient<'_, M, D>,
        now_ms: u32,
    ) -> CycleReport {
        let bank = &self.bank;
        let published = client
            .update(|state| {
                state.shutdown_flag = bank.coil(coil::SHUTDOWN_FLAG);
                state.display_state = bank.coil(coil::DISPLAY_STATE);
                state.joy1_enable = bank.coil(coil::JOY1_ENABLE);
                state.joy2_enable = bank.coil(coil::JOY2_ENABLE);
                state.joy1_brightness = clamp_level(bank.holding(holding::JOY1_BRIGHTNESS));
                state.joy2_brightness = clamp_level(bank.holding(holding::JOY2_BRIGHTNESS));
            })
            .await;

        // Cache is current when the update went through, last known otherwise
        let state = client.cached();
        self.bank
            .set_discrete_input(discrete::SHUTDOWN_REQUEST, state.shutdown_request);
        self.bank
            .set_input(input::SELECTED_GAME, state.selector_value as u16);

        let heartbeat = if self.check_timer.due(now_ms) {
            Some(self.heartbeat.check(self.bank.holding(holding::SBC_HEARTBEAT)))
        } else {
            None
        };

        self.mcu_counter = self.mcu_counter.wrapping_add(1);
        self.bank.set_input(input::MCU_HEARTBEAT, self.mcu_counter);

        CycleReport {
            heartbeat,
            published,
            mcu_counter: self.mcu_counter,
        }
    }

    /// Clear the SBC shutdown coil
    ///
    /// The SBC sets this coil before powering down and cannot clear it
    /// afterwards, so the supervisor resets it whenever it clears the
    /// matching store field. Otherwise the next exchange would republish it.
    pub fn clear_shutdown_flag(&mut self) {
        self.bank.set_coil(coil::SHUTDOWN_FLAG, false);
    }

    /// Whether the SBC heartbeat is alive
    pub fn connected(&self) -> bool {
        self.heartbeat.connected()
    }

    /// Heartbeat monitor state
    pub fn heartbeat(&self) -> &HeartbeatMonitor {
        &self.heartbeat
    }

    /// Register bank as last exchanged
    pub fn bank(&self) -> &SupervisorBank {
        &self.bank
    }

    /// Slave address in use
    pub fn address(&self) -> u8 {
        self.slave.address()
    }
}

/// Brightness registers are 16 bits wide but only 0-255 is meaningful
fn clamp_level(value: u16) -> u8 {
    value.min(u8::MAX as u16) as u8
}
