//! Software PWM task
//!
//! Drives the joystick LEDs from the duties the poll task publishes.

use defmt::*;
use embassy_rp::gpio::Level;
use embassy_time::{Duration, Ticker};

use cady_drivers::SoftPwm;

use crate::board::{LightResources, LIGHT_CHANNELS};
use crate::context::Context;

/// PWM task - one tick per configured period
#[embassy_executor::task]
pub async fn pwm_task(ctx: &'static Context, res: LightResources) {
    info!("PWM task started");

    let LightResources { mut leds } = res;
    let mut pwm = SoftPwm::<LIGHT_CHANNELS>::new();
    let mut ticker = Ticker::every(Duration::from_micros(ctx.config.lights.pwm_tick_us as u64));

    loop {
        ticker.next().await;

        let levels = pwm.tick(&ctx.duties);
        for (led, high) in leds.iter_mut().zip(levels) {
            led.set_level(Level::from(high));
        }
    }
}
