//! Lifecycle controller
//!
//! Drives the collaborators from the [`AppState`] machine. One call to
//! [`LifecycleController::tick`] per poll cycle:
//!
//! 1. derives the long-press edge and the state timeouts,
//! 2. computes the next state with [`AppState::next`],
//! 3. runs the entry action when the state changes (or on a long press),
//! 4. runs the per-tick steady actions,
//! 5. returns the values the poll task must publish to the shared store.
//!
//! Entry actions:
//!
//! | state         | SBC | joysticks     | lights              | display        |
//! |---------------|-----|---------------|---------------------|----------------|
//! | Off           | off | off           | Off                 | forced off     |
//! | Booting       | on  | off           | Blinking            | forced off     |
//! | Connected     | -   | per enable    | Manual              | released       |
//! | ShuttingDown  | -   | off           | AlternatingBlinking | forced off     |
//! | Error         | -   | off           | FastBlinking        | released, on   |

use crate::config::LifecycleConfig;
use crate::shared::SharedState;
use crate::state::{AppState, ErrorKind, TickEvents};
use crate::traits::{
    ButtonInput, DisplayForceOff, LightEffect, LightEffectController, PowerOutput, SelectorInput,
};

/// Collaborators driven by the controller
pub struct Actuators<P, L, D> {
    /// SBC power rail
    pub sbc: P,
    /// Joystick 1 power rail
    pub joy1: P,
    /// Joystick 2 power rail
    pub joy2: P,
    /// Joystick light effects
    pub lights: L,
    /// Display force-off override
    pub display: D,
}

/// Inputs sampled once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickInputs {
    /// Button clicked since the last tick
    pub clicked: bool,
    /// Button held past the long-press threshold
    pub long_pressed: bool,
    /// SBC heartbeat alive
    pub connected: bool,
    /// Store snapshot taken after the transport exchange
    pub shared: SharedState,
    /// Applied game selection
    pub selector_value: u8,
    /// Monotonic clock
    pub now_ms: u32,
}

impl TickInputs {
    /// Sample the button and selector, then clear the button's latched events
    pub fn sample<B: ButtonInput, S: SelectorInput>(
        button: &mut B,
        selector: &S,
        connected: bool,
        shared: SharedState,
        now_ms: u32,
    ) -> Self {
        let inputs = Self {
            clicked: button.clicked(),
            long_pressed: button.long_pressed(),
            connected,
            shared,
            selector_value: selector.read(),
            now_ms,
        };
        button.clear_state();
        inputs
    }
}

/// Store fields the poll task publishes after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SharedWrites {
    /// True iff the state is [`AppState::ShuttingDown`]
    pub shutdown_request: bool,
    /// A state entry asked for the SBC shutdown flag to be cleared
    pub clear_shutdown_flag: bool,
    /// Game selection to report to the SBC
    pub selector_value: u8,
    /// Current force-off decision
    pub display_force_off: bool,
    /// Display must be on regardless of the SBC request
    pub force_display_on: bool,
}

impl SharedWrites {
    /// Apply to a store snapshot inside one lock
    pub fn apply(&self, state: &mut SharedState) {
        state.shutdown_request = self.shutdown_request;
        state.selector_value = self.selector_value;
        state.display_force_off = self.display_force_off;
        if self.clear_shutdown_flag {
            state.shutdown_flag = false;
        }
        if self.force_display_on {
            state.display_state = true;
        }
    }
}

/// A state entry performed during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transition {
    pub from: AppState,
    pub to: AppState,
    /// Set when entering [`AppState::Error`]
    pub cause: Option<ErrorKind>,
    /// Entered through the long-press override
    pub forced: bool,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickOutcome {
    pub writes: SharedWrites,
    pub transition: Option<Transition>,
}

/// Effectful side of the lifecycle state machine
pub struct LifecycleController<P, L, D> {
    state: AppState,
    entered_at_ms: u32,
    long_press_armed: bool,
    clear_flag_pending: bool,
    last_error: Option<ErrorKind>,
    config: LifecycleConfig,
    actuators: Actuators<P, L, D>,
}

impl<P, L, D> LifecycleController<P, L, D>
where
    P: PowerOutput,
    L: LightEffectController,
    D: DisplayForceOff,
{
    /// Create a controller in [`AppState::Off`], running its entry action
    pub fn new(actuators: Actuators<P, L, D>, config: LifecycleConfig, now_ms: u32) -> Self {
        let mut controller = Self {
            state: AppState::Off,
            entered_at_ms: now_ms,
            long_press_armed: true,
            clear_flag_pending: false,
            last_error: None,
            config,
            actuators,
        };
        controller.enter(AppState::Off, &SharedState::new(), now_ms);
        controller
    }

    /// Current state
    pub fn state(&self) -> AppState {
        self.state
    }

    /// Cause of the most recent entry into [`AppState::Error`]
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// Time spent in the current state
    pub fn elapsed_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.entered_at_ms)
    }

    /// Driven collaborators
    pub fn actuators(&self) -> &Actuators<P, L, D> {
        &self.actuators
    }

    /// Driven collaborators, mutably
    pub fn actuators_mut(&mut self) -> &mut Actuators<P, L, D> {
        &mut self.actuators
    }

    /// Advance the state machine by one poll cycle
    pub fn tick(&mut self, inputs: &TickInputs) -> TickOutcome {
        let long_press_edge = inputs.long_pressed && self.long_press_armed;
        self.long_press_armed = !inputs.long_pressed;

        let elapsed = self.elapsed_ms(inputs.now_ms);
        let events = TickEvents {
            long_press_edge,
            clicked: inputs.clicked,
            connected: inputs.connected,
            shutdown_flag: inputs.shared.shutdown_flag,
            boot_timed_out: elapsed >= self.config.boot_timeout_ms,
            shutdown_elapsed: elapsed >= self.config.shutdown_duration_ms,
        };

        let from = self.state;
        let to = from.next(&events);

        let transition = if to != from || long_press_edge {
            let cause = AppState::error_cause(from, to);
            if cause.is_some() {
                self.last_error = cause;
            }
            self.enter(to, &inputs.shared, inputs.now_ms);
            Some(Transition {
                from,
                to,
                cause,
                forced: long_press_edge,
            })
        } else {
            None
        };

        self.steady(&inputs.shared);

        let writes = SharedWrites {
            shutdown_request: self.state.requests_shutdown(),
            clear_shutdown_flag: core::mem::take(&mut self.clear_flag_pending),
            selector_value: inputs.selector_value,
            display_force_off: self.actuators.display.is_forced(),
            force_display_on: self.state == AppState::Error,
        };

        TickOutcome { writes, transition }
    }

    fn enter(&mut self, state: AppState, shared: &SharedState, now_ms: u32) {
        let a = &mut self.actuators;
        match state {
            AppState::Off => {
                a.sbc.off();
                a.joy1.off();
                a.joy2.off();
                a.lights.set_effect(LightEffect::Off);
                a.display.force();
                self.clear_flag_pending = true;
            }
            AppState::Booting => {
                a.sbc.on();
                a.joy1.off();
                a.joy2.off();
                a.lights.set_effect(LightEffect::Blinking);
                a.display.force();
            }
            AppState::Connected => {
                a.joy1.set(shared.joy1_enable);
                a.joy2.set(shared.joy2_enable);
                a.lights.set_effect(LightEffect::Manual);
                a.display.release();
            }
            AppState::ShuttingDown => {
                a.joy1.off();
                a.joy2.off();
                a.lights.set_effect(LightEffect::AlternatingBlinking);
                a.display.force();
                self.clear_flag_pending = true;
            }
            AppState::Error => {
                a.joy1.off();
                a.joy2.off();
                a.lights.set_effect(LightEffect::FastBlinking);
                a.display.release();
                self.clear_flag_pending = true;
            }
        }
        self.state = state;
        self.entered_at_ms = now_ms;
    }

    fn steady(&mut self, shared: &SharedState) {
        let a = &mut self.actuators;
        match self.state {
            AppState::Off => a.sbc.off(),
            AppState::Connected => {
                a.joy1.set(shared.joy1_enable);
                a.joy2.set(shared.joy2_enable);
            }
            _ => {}
        }
        a.lights
            .set_manual_brightness(shared.joy1_brightness, shared.joy2_brightness);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeartbeatConfig, ModbusConfig};
    use crate::shared::tests::NoWait;
    use crate::shared::{SharedStateStore, StoreClient};
    use crate::traits::ForceOffLatch;
    use crate::transport::{RegisterTransport, ReplyBuffer, RxOutcome};
    use cady_protocol::map::coil;
    use cady_protocol::Frame;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    const BOOT_TIMEOUT: u32 = 120_000;
    const SHUTDOWN: u32 = 30_000;

    #[derive(Debug, Default)]
    struct MockPower {
        on: bool,
        /// Number of `off` calls, to check steady re-assertion
        offs: u32,
    }

    impl PowerOutput for MockPower {
        fn on(&mut self) {
            self.on = true;
        }

        fn off(&mut self) {
            self.on = false;
            self.offs += 1;
        }

        fn is_on(&self) -> bool {
            self.on
        }
    }

    #[derive(Debug)]
    struct MockLights {
        effect: LightEffect,
        manual: (u8, u8),
    }

    impl LightEffectController for MockLights {
        fn set_effect(&mut self, effect: LightEffect) {
            self.effect = effect;
        }

        fn set_manual_brightness(&mut self, joy1: u8, joy2: u8) {
            self.manual = (joy1, joy2);
        }

        fn effect(&self) -> LightEffect {
            self.effect
        }
    }

    type TestController = LifecycleController<MockPower, MockLights, ForceOffLatch>;

    fn controller() -> TestController {
        let actuators = Actuators {
            sbc: MockPower::default(),
            joy1: MockPower::default(),
            joy2: MockPower::default(),
            lights: MockLights {
                effect: LightEffect::Manual,
                manual: (0, 0),
            },
            display: ForceOffLatch::new(),
        };
        LifecycleController::new(actuators, LifecycleConfig::default(), 0)
    }

    fn at(now_ms: u32) -> TickInputs {
        TickInputs {
            now_ms,
            ..Default::default()
        }
    }

    fn click(now_ms: u32) -> TickInputs {
        TickInputs {
            clicked: true,
            ..at(now_ms)
        }
    }

    fn connected(now_ms: u32) -> TickInputs {
        TickInputs {
            connected: true,
            ..at(now_ms)
        }
    }

    fn long_press(now_ms: u32) -> TickInputs {
        TickInputs {
            long_pressed: true,
            ..at(now_ms)
        }
    }

    /// Off -> Booting -> Connected
    fn connected_controller() -> TestController {
        let mut c = controller();
        c.tick(&click(0));
        c.tick(&connected(1000));
        assert_eq!(c.state(), AppState::Connected);
        c
    }

    #[test]
    fn test_starts_off_with_entry_action() {
        let c = controller();
        let a = c.actuators();
        assert_eq!(c.state(), AppState::Off);
        assert!(!a.sbc.is_on());
        assert_eq!(a.lights.effect(), LightEffect::Off);
        assert!(a.display.is_forced());
    }

    #[test]
    fn test_click_boots_sbc() {
        let mut c = controller();
        let outcome = c.tick(&click(100));

        assert_eq!(c.state(), AppState::Booting);
        assert_eq!(
            outcome.transition,
            Some(Transition {
                from: AppState::Off,
                to: AppState::Booting,
                cause: None,
                forced: false,
            })
        );
        let a = c.actuators();
        assert!(a.sbc.is_on());
        assert!(!a.joy1.is_on());
        assert_eq!(a.lights.effect(), LightEffect::Blinking);
        assert!(a.display.is_forced());
    }

    #[test]
    fn test_boot_timeout_exact_boundary() {
        let mut c = controller();
        c.tick(&click(1000));

        c.tick(&at(1000 + BOOT_TIMEOUT - 1));
        assert_eq!(c.state(), AppState::Booting);

        let outcome = c.tick(&at(1000 + BOOT_TIMEOUT));
        assert_eq!(c.state(), AppState::Error);
        assert_eq!(outcome.transition.unwrap().cause, Some(ErrorKind::BootTimeout));
        assert_eq!(c.last_error(), Some(ErrorKind::BootTimeout));
    }

    #[test]
    fn test_connect_before_timeout() {
        let mut c = controller();
        c.tick(&click(0));
        c.tick(&connected(45_000));

        assert_eq!(c.state(), AppState::Connected);
        assert_eq!(c.actuators().lights.effect(), LightEffect::Manual);
        assert!(!c.actuators().display.is_forced());
    }

    #[test]
    fn test_frozen_heartbeat_scenario() {
        let mut c = controller();
        c.tick(&click(0));
        assert!(c.actuators().sbc.is_on());

        // Counter never moves: connected stays false for 121 s
        let mut now = 0;
        while now <= 121_000 {
            c.tick(&at(now));
            now += 20;
        }

        let a = c.actuators();
        assert_eq!(c.state(), AppState::Error);
        assert!(!a.joy1.is_on());
        assert!(!a.joy2.is_on());
        assert_eq!(a.lights.effect(), LightEffect::FastBlinking);
        assert!(!a.display.is_forced());

        let outcome = c.tick(&at(now));
        assert!(outcome.writes.force_display_on);
        assert!(!outcome.writes.shutdown_request);
    }

    #[test]
    fn test_connected_follows_joy_enables() {
        let mut c = connected_controller();

        let mut inputs = connected(2000);
        inputs.shared.joy1_enable = true;
        inputs.shared.joy1_brightness = 40;
        c.tick(&inputs);

        let a = c.actuators();
        assert!(a.joy1.is_on());
        assert!(!a.joy2.is_on());
        assert_eq!(a.lights.manual, (40, 0));
    }

    #[test]
    fn test_shutdown_flag_scenario() {
        let mut c = connected_controller();

        let mut inputs = connected(5000);
        inputs.shared.joy1_enable = true;
        c.tick(&inputs);
        assert!(c.actuators().joy1.is_on());

        inputs.now_ms = 5020;
        inputs.shared.shutdown_flag = true;
        let outcome = c.tick(&inputs);

        assert_eq!(c.state(), AppState::ShuttingDown);
        assert!(outcome.writes.shutdown_request);
        assert!(outcome.writes.clear_shutdown_flag);
        assert!(!c.actuators().joy1.is_on());
        assert!(!c.actuators().joy2.is_on());
        assert_eq!(
            c.actuators().lights.effect(),
            LightEffect::AlternatingBlinking
        );

        // Connectivity no longer matters
        c.tick(&at(5020 + SHUTDOWN - 1));
        assert_eq!(c.state(), AppState::ShuttingDown);

        let outcome = c.tick(&at(5020 + SHUTDOWN));
        assert_eq!(c.state(), AppState::Off);
        assert!(!c.actuators().sbc.is_on());
        assert!(!outcome.writes.shutdown_request);
    }

    #[test]
    fn test_click_while_connected_requests_shutdown() {
        let mut c = connected_controller();
        let mut inputs = click(3000);
        inputs.connected = true;
        c.tick(&inputs);
        assert_eq!(c.state(), AppState::ShuttingDown);
    }

    #[test]
    fn test_disconnect_while_connected_is_error() {
        let mut c = connected_controller();
        let outcome = c.tick(&at(3000));
        assert_eq!(c.state(), AppState::Error);
        assert_eq!(outcome.transition.unwrap().cause, Some(ErrorKind::ConnectionLost));
    }

    #[test]
    fn test_click_leaves_error() {
        let mut c = connected_controller();
        c.tick(&at(3000));
        assert_eq!(c.state(), AppState::Error);

        c.tick(&click(4000));
        assert_eq!(c.state(), AppState::Off);
        assert!(!c.actuators().sbc.is_on());
    }

    #[test]
    fn test_long_press_forces_off_from_every_state() {
        let setups: [fn() -> TestController; 3] = [controller, connected_controller, || {
            let mut c = controller();
            c.tick(&click(0));
            c
        }];

        for setup in setups {
            let mut c = setup();
            let outcome = c.tick(&long_press(10_000));
            assert_eq!(c.state(), AppState::Off);
            assert!(outcome.transition.unwrap().forced);
            assert!(!c.actuators().sbc.is_on());
        }
    }

    #[test]
    fn test_long_press_fires_once_per_hold() {
        let mut c = connected_controller();
        c.tick(&long_press(2000));
        assert_eq!(c.state(), AppState::Off);

        // Still held: no new edge, and a click in the same tick boots
        let mut inputs = long_press(2020);
        inputs.clicked = true;
        let outcome = c.tick(&inputs);
        assert_eq!(c.state(), AppState::Booting);
        assert!(!outcome.transition.unwrap().forced);

        // Release re-arms
        c.tick(&at(2040));
        c.tick(&long_press(2060));
        assert_eq!(c.state(), AppState::Off);
    }

    #[test]
    fn test_off_entry_idempotent() {
        let mut once = controller();
        let mut twice = controller();

        let mut start = SharedState::new();
        start.shutdown_flag = true;
        start.display_state = true;
        let mut once_state = start;
        let mut twice_state = start;

        let once_writes = once.tick(&long_press(100)).writes;
        once_writes.apply(&mut once_state);

        twice.tick(&long_press(100)).writes.apply(&mut twice_state);
        twice.tick(&at(120)).writes.apply(&mut twice_state);
        let twice_writes = twice.tick(&long_press(140)).writes;
        twice_writes.apply(&mut twice_state);

        let (a, b) = (once.actuators(), twice.actuators());
        assert_eq!(once.state(), twice.state());
        assert_eq!(a.sbc.is_on(), b.sbc.is_on());
        assert_eq!(a.joy1.is_on(), b.joy1.is_on());
        assert_eq!(a.joy2.is_on(), b.joy2.is_on());
        assert_eq!(a.lights.effect(), b.lights.effect());
        assert_eq!(a.display.is_forced(), b.display.is_forced());

        assert_eq!(once_writes, twice_writes);
        assert!(twice_writes.clear_shutdown_flag);
        assert_eq!(once_state, twice_state);
        assert!(!twice_state.shutdown_flag);
    }

    #[test]
    fn test_off_reasserts_sbc_power_every_tick() {
        let mut c = controller();
        let before = c.actuators().sbc.offs;
        c.tick(&at(20));
        c.tick(&at(40));
        assert_eq!(c.actuators().sbc.offs, before + 2);
    }

    #[test]
    fn test_writes_publish_selector_and_force_off() {
        let mut c = controller();
        let mut inputs = at(20);
        inputs.selector_value = 6;

        let writes = c.tick(&inputs).writes;
        assert_eq!(writes.selector_value, 6);
        assert!(writes.display_force_off);
        // Pending clear from the startup entry is handed out once
        assert!(writes.clear_shutdown_flag);
        assert!(!c.tick(&inputs).writes.clear_shutdown_flag);
    }

    #[test]
    fn test_writes_apply_to_state() {
        let mut state = SharedState::new();
        state.shutdown_flag = true;

        let writes = SharedWrites {
            shutdown_request: true,
            clear_shutdown_flag: true,
            selector_value: 3,
            display_force_off: false,
            force_display_on: true,
        };
        writes.apply(&mut state);

        assert!(state.shutdown_request);
        assert!(!state.shutdown_flag);
        assert_eq!(state.selector_value, 3);
        assert!(state.display_state);
    }

    #[test]
    fn test_sample_clears_button() {
        struct Latched {
            clicked: bool,
        }

        impl ButtonInput for Latched {
            fn pressed(&self) -> bool {
                false
            }
            fn clicked(&self) -> bool {
                self.clicked
            }
            fn long_pressed(&self) -> bool {
                false
            }
            fn clear_state(&mut self) {
                self.clicked = false;
            }
        }

        struct Fixed;

        impl SelectorInput for Fixed {
            fn read(&self) -> u8 {
                4
            }
        }

        let mut button = Latched { clicked: true };
        let inputs = TickInputs::sample(&mut button, &Fixed, true, SharedState::new(), 7);
        assert!(inputs.clicked);
        assert_eq!(inputs.selector_value, 4);
        assert!(!button.clicked);
    }

    /// One poll cycle wired the way the firmware runs it
    async fn cycle(
        c: &mut TestController,
        transport: &mut RegisterTransport,
        client: &mut StoreClient<'_, NoopRawMutex, NoWait>,
        clicked: bool,
        now_ms: u32,
    ) -> TickOutcome {
        transport.exchange(client, now_ms).await;
        let inputs = TickInputs {
            clicked,
            connected: transport.connected(),
            shared: client.cached(),
            now_ms,
            ..Default::default()
        };
        let outcome = c.tick(&inputs);
        let writes = outcome.writes;
        if writes.clear_shutdown_flag {
            transport.clear_shutdown_flag();
        }
        client.update(|state| writes.apply(state)).await;
        outcome
    }

    /// Feed one master request into the transport
    fn sbc_writes(transport: &mut RegisterTransport, function: u8, data: &[u8], now_ms: u32) {
        let bytes = Frame::new(1, function, data)
            .unwrap()
            .encode_to_vec()
            .unwrap();
        let mut reply = ReplyBuffer::new();
        let mut outcome = RxOutcome::Pending;
        for &byte in bytes.iter() {
            outcome = transport.receive(byte, now_ms, &mut reply);
        }
        assert!(matches!(outcome, RxOutcome::Replied { .. }));
    }

    #[test]
    fn test_shutdown_coil_cleared_for_next_boot() {
        let store = SharedStateStore::<NoopRawMutex>::new();
        let mut client = store.client(NoWait);
        let mut transport =
            RegisterTransport::new(&ModbusConfig::default(), &HeartbeatConfig::default());
        let mut c = controller();
        let period = HeartbeatConfig::default().period_ms;

        block_on(async {
            cycle(&mut c, &mut transport, &mut client, true, 0).await;
            assert_eq!(c.state(), AppState::Booting);

            // SBC heartbeat counter 1
            sbc_writes(&mut transport, 0x06, &[0, 0, 0, 1], period - 10);
            cycle(&mut c, &mut transport, &mut client, false, period).await;
            assert_eq!(c.state(), AppState::Connected);

            // SBC announces its shutdown on coil 0
            sbc_writes(&mut transport, 0x05, &[0, 0, 0xFF, 0x00], period + 10);
            let t0 = period + 20;
            let outcome = cycle(&mut c, &mut transport, &mut client, false, t0).await;
            assert_eq!(c.state(), AppState::ShuttingDown);
            assert!(outcome.writes.shutdown_request);
            assert!(outcome.writes.clear_shutdown_flag);
            assert!(!transport.bank().coil(coil::SHUTDOWN_FLAG));
            assert!(!client.cached().shutdown_flag);
            assert!(client.cached().shutdown_request);

            // Not republished by the next exchange
            cycle(&mut c, &mut transport, &mut client, false, t0 + 20).await;
            assert!(!client.shutdown_flag().await);

            cycle(&mut c, &mut transport, &mut client, false, t0 + SHUTDOWN).await;
            assert_eq!(c.state(), AppState::Off);
            assert!(!c.actuators().sbc.is_on());

            // Next boot stays up once the SBC connects again
            let t1 = t0 + SHUTDOWN + 20;
            cycle(&mut c, &mut transport, &mut client, true, t1).await;
            assert_eq!(c.state(), AppState::Booting);
            sbc_writes(&mut transport, 0x06, &[0, 0, 0, 2], t1 + 10);
            cycle(&mut c, &mut transport, &mut client, false, t1 + period).await;
            assert_eq!(c.state(), AppState::Connected);
            let outcome = cycle(&mut c, &mut transport, &mut client, false, t1 + period + 20).await;
            assert_eq!(c.state(), AppState::Connected);
            assert!(!outcome.writes.shutdown_request);
        });
    }
}
