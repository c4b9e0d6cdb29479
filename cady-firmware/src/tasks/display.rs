//! Display supervision task
//!
//! Keeps the display's power state in line with the SBC request and the
//! lifecycle's force-off flag by pressing the display's power key.

use defmt::*;
use embassy_rp::gpio::Level;
use embassy_time::{Delay, Duration, Ticker, Timer};

use cady_drivers::{want_display_on, DisplayAction, DisplaySupervisor};

use super::now_ms;
use crate::board::DisplayResources;
use crate::context::Context;

/// Display task - runs on the thread-mode executor
#[embassy_executor::task]
pub async fn display_task(ctx: &'static Context, res: DisplayResources) {
    info!("Display task started");

    let config = &ctx.config.display;
    let DisplayResources {
        mut control,
        detect,
    } = res;

    let mut supervisor = DisplaySupervisor::new(config);
    let mut client = ctx
        .store
        .client(Delay)
        .with_wait(ctx.config.lifecycle.lock_wait_ms);

    control.set_level(Level::from(supervisor.control_level(false)));

    let mut ticker = Ticker::every(Duration::from_millis(config.interval_ms as u64));

    loop {
        ticker.next().await;

        // Falls back to the last snapshot when the poll task holds the lock
        let state = client.snapshot().await;
        let want_on = want_display_on(state.display_state, state.display_force_off);
        let detected_on = supervisor.detected_on(detect.is_high());

        if let DisplayAction::Press { turning_on } =
            supervisor.update(want_on, detected_on, now_ms())
        {
            if turning_on {
                info!("Display on");
            } else {
                info!("Display off");
            }

            control.set_level(Level::from(supervisor.control_level(true)));
            Timer::after_millis(config.press_ms as u64).await;
            control.set_level(Level::from(supervisor.control_level(false)));
        }
    }
}
