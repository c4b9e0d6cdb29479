//! Embassy async tasks
//!
//! Tasks share state only through the [`Context`](crate::context::Context)
//! they receive at spawn time.

pub mod display;
pub mod poll;
pub mod pwm;

pub use display::display_task;
pub use poll::poll_task;
pub use pwm::pwm_task;

use embassy_time::Instant;

/// Millisecond clock used by the core logic; wraps after ~49 days
pub fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}
