//! Shared task context
//!
//! Everything the tasks share lives in one [`Context`] placed in a static
//! cell at startup and handed to each task as `&'static Context`.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;

use cady_core::config::BoardConfig;
use cady_core::shared::SharedStateStore;
use cady_drivers::SoftPwmDuties;

use crate::board::LIGHT_CHANNELS;

/// State shared by the poll, display and PWM tasks
pub struct Context {
    /// Scalars exchanged between the poll task and the display task
    pub store: SharedStateStore<CriticalSectionRawMutex>,
    /// Joystick LED duties written by the poll task, output by the PWM task
    pub duties: SoftPwmDuties<LIGHT_CHANNELS>,
    /// Board configuration parsed at startup
    pub config: BoardConfig,
}

static CONTEXT: StaticCell<Context> = StaticCell::new();

/// Create the context; may only be called once
pub fn init(config: BoardConfig) -> &'static Context {
    CONTEXT.init(Context {
        store: SharedStateStore::new(),
        duties: SoftPwmDuties::new(),
        config,
    })
}
