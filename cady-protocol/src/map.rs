//! Supervisor register map
//!
//! | bank           | addr | meaning                          | written by |
//! |----------------|------|----------------------------------|------------|
//! | coil           | 0    | SBC is shutting down             | SBC        |
//! | coil           | 1    | requested display power          | SBC        |
//! | coil           | 2    | joystick 1 enable                | SBC        |
//! | coil           | 3    | joystick 2 enable                | SBC        |
//! | discrete input | 0    | MCU requests SBC shutdown        | MCU        |
//! | holding        | 0    | SBC heartbeat counter            | SBC        |
//! | holding        | 1    | joystick 1 brightness (0-255)    | SBC        |
//! | holding        | 2    | joystick 2 brightness (0-255)    | SBC        |
//! | input          | 0    | MCU heartbeat counter            | MCU        |
//! | input          | 1    | selected game index (0-255)      | MCU        |

use crate::bank::RegisterBank;

/// Default slave address of the supervisor
pub const SLAVE_ADDRESS: u8 = 1;

/// Default line rate (8N1)
pub const BAUD_RATE: u32 = 19_200;

/// Coil addresses
pub mod coil {
    pub const SHUTDOWN_FLAG: usize = 0;
    pub const DISPLAY_STATE: usize = 1;
    pub const JOY1_ENABLE: usize = 2;
    pub const JOY2_ENABLE: usize = 3;
    pub const COUNT: usize = 4;
}

/// Discrete input addresses
pub mod discrete {
    pub const SHUTDOWN_REQUEST: usize = 0;
    pub const COUNT: usize = 1;
}

/// Holding register addresses
pub mod holding {
    pub const SBC_HEARTBEAT: usize = 0;
    pub const JOY1_BRIGHTNESS: usize = 1;
    pub const JOY2_BRIGHTNESS: usize = 2;
    pub const COUNT: usize = 3;
}

/// Input register addresses
pub mod input {
    pub const MCU_HEARTBEAT: usize = 0;
    pub const SELECTED_GAME: usize = 1;
    pub const COUNT: usize = 2;
}

/// Register bank sized for the supervisor map
pub type SupervisorBank =
    RegisterBank<{ coil::COUNT }, { discrete::COUNT }, { holding::COUNT }, { input::COUNT }>;
