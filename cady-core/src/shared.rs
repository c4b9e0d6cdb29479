//! Shared state store
//!
//! The only data channel between the real-time poll task and the display
//! task. Every access takes one mutex with a bounded wait; when the wait
//! expires a read falls back to the client's cached snapshot and a write is
//! dropped. Owners re-publish every field each poll cycle, so a lost write
//! only delays visibility by one cycle.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embedded_hal_async::delay::DelayNs;

/// Bounded wait for the store lock
pub const LOCK_WAIT_MS: u32 = 5;

/// Scalar fields shared between tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SharedState {
    /// MCU asks the SBC to shut down
    pub shutdown_request: bool,
    /// SBC reports that it is shutting down
    pub shutdown_flag: bool,
    /// SBC-requested display power
    pub display_state: bool,
    /// SBC-requested joystick 1 enable
    pub joy1_enable: bool,
    /// SBC-requested joystick 2 enable
    pub joy2_enable: bool,
    /// SBC-requested joystick 1 LED brightness
    pub joy1_brightness: u8,
    /// SBC-requested joystick 2 LED brightness
    pub joy2_brightness: u8,
    /// Selected game index reported to the SBC
    pub selector_value: u8,
    /// Display supervisor must keep the display off
    pub display_force_off: bool,
}

/// Field selector for [`StoreClient::get`] and [`StoreClient::set`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    ShutdownRequest,
    ShutdownFlag,
    DisplayState,
    Joy1Enable,
    Joy2Enable,
    Joy1Brightness,
    Joy2Brightness,
    SelectorValue,
    DisplayForceOff,
}

/// A field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    Flag(bool),
    Level(u8),
}

impl Value {
    /// Value as a flag; non-zero levels are true
    pub fn as_bool(self) -> bool {
        match self {
            Value::Flag(flag) => flag,
            Value::Level(level) => level != 0,
        }
    }

    /// Value as a level; flags map to 0 and 1
    pub fn as_u8(self) -> u8 {
        match self {
            Value::Flag(flag) => flag as u8,
            Value::Level(level) => level,
        }
    }
}

impl SharedState {
    /// Boot state: everything off and zero
    pub const fn new() -> Self {
        Self {
            shutdown_request: false,
            shutdown_flag: false,
            display_state: false,
            joy1_enable: false,
            joy2_enable: false,
            joy1_brightness: 0,
            joy2_brightness: 0,
            selector_value: 0,
            display_force_off: false,
        }
    }

    /// Read one field
    pub fn get(&self, field: Field) -> Value {
        match field {
            Field::ShutdownRequest => Value::Flag(self.shutdown_request),
            Field::ShutdownFlag => Value::Flag(self.shutdown_flag),
            Field::DisplayState => Value::Flag(self.display_state),
            Field::Joy1Enable => Value::Flag(self.joy1_enable),
            Field::Joy2Enable => Value::Flag(self.joy2_enable),
            Field::Joy1Brightness => Value::Level(self.joy1_brightness),
            Field::Joy2Brightness => Value::Level(self.joy2_brightness),
            Field::SelectorValue => Value::Level(self.selector_value),
            Field::DisplayForceOff => Value::Flag(self.display_force_off),
        }
    }

    /// Write one field, converting the value to the field's type
    pub fn set(&mut self, field: Field, value: Value) {
        match field {
            Field::ShutdownRequest => self.shutdown_request = value.as_bool(),
            Field::ShutdownFlag => self.shutdown_flag = value.as_bool(),
            Field::DisplayState => self.display_state = value.as_bool(),
            Field::Joy1Enable => self.joy1_enable = value.as_bool(),
            Field::Joy2Enable => self.joy2_enable = value.as_bool(),
            Field::Joy1Brightness => self.joy1_brightness = value.as_u8(),
            Field::Joy2Brightness => self.joy2_brightness = value.as_u8(),
            Field::SelectorValue => self.selector_value = value.as_u8(),
            Field::DisplayForceOff => self.display_force_off = value.as_bool(),
        }
    }
}

/// Mutex-guarded [`SharedState`]
pub struct SharedStateStore<M: RawMutex> {
    inner: Mutex<M, SharedState>,
}

impl<M: RawMutex> Default for SharedStateStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> SharedStateStore<M> {
    /// Create a store holding the boot state
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(SharedState::new()),
        }
    }

    /// Create a per-task client using `delay` for the bounded lock wait
    pub fn client<D: DelayNs>(&self, delay: D) -> StoreClient<'_, M, D> {
        StoreClient {
            store: self,
            delay,
            wait_ms: LOCK_WAIT_MS,
            cache: SharedState::new(),
        }
    }
}

/// One task's handle on the store
///
/// Holds a cache of the last snapshot it managed to read, which is what
/// reads return when the lock cannot be taken in time.
pub struct StoreClient<'a, M: RawMutex, D> {
    store: &'a SharedStateStore<M>,
    delay: D,
    wait_ms: u32,
    cache: SharedState,
}

impl<'a, M: RawMutex, D: DelayNs> StoreClient<'a, M, D> {
    /// Override the bounded wait
    pub fn with_wait(mut self, wait_ms: u32) -> Self {
        self.wait_ms = wait_ms;
        self
    }

    async fn lock(&mut self) -> Option<MutexGuard<'a, M, SharedState>> {
        let store = self.store;
        match select(store.inner.lock(), self.delay.delay_ms(self.wait_ms)).await {
            Either::First(guard) => Some(guard),
            Either::Second(()) => None,
        }
    }

    /// Last snapshot this client read, without locking
    pub fn cached(&self) -> SharedState {
        self.cache
    }

    /// Read every field under one lock
    pub async fn snapshot(&mut self) -> SharedState {
        if let Some(guard) = self.lock().await {
            self.cache = *guard;
        }
        self.cache
    }

    /// Modify fields under one lock
    ///
    /// Returns false when the lock timed out and nothing was written.
    pub async fn update(&mut self, f: impl FnOnce(&mut SharedState)) -> bool {
        match self.lock().await {
            Some(mut guard) => {
                f(&mut *guard);
                self.cache = *guard;
                true
            }
            None => false,
        }
    }

    /// Read one field
    pub async fn get(&mut self, field: Field) -> Value {
        self.snapshot().await.get(field)
    }

    /// Write one field; dropped silently on lock timeout
    pub async fn set(&mut self, field: Field, value: Value) {
        self.update(|state| state.set(field, value)).await;
    }

    pub async fn shutdown_flag(&mut self) -> bool {
        self.get(Field::ShutdownFlag).await.as_bool()
    }

    pub async fn shutdown_request(&mut self) -> bool {
        self.get(Field::ShutdownRequest).await.as_bool()
    }

    pub async fn display_force_off(&mut self) -> bool {
        self.get(Field::DisplayForceOff).await.as_bool()
    }

    pub async fn selector_value(&mut self) -> u8 {
        self.get(Field::SelectorValue).await.as_u8()
    }

    pub async fn set_shutdown_request(&mut self, request: bool) {
        self.set(Field::ShutdownRequest, Value::Flag(request)).await;
    }

    pub async fn set_shutdown_flag(&mut self, flag: bool) {
        self.set(Field::ShutdownFlag, Value::Flag(flag)).await;
    }

    pub async fn set_display_force_off(&mut self, forced: bool) {
        self.set(Field::DisplayForceOff, Value::Flag(forced)).await;
    }

    pub async fn set_selector_value(&mut self, value: u8) {
        self.set(Field::SelectorValue, Value::Level(value)).await;
    }
}
