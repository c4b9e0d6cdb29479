//! Modbus RTU slave for the Cady supervisor
//!
//! This crate implements the serial side of the link between the
//! supervisor MCU (slave) and the companion SBC (master). The SBC polls a
//! small fixed register map; the MCU answers from a local [`RegisterBank`].
//!
//! # Frame Overview
//!
//! Every request and response uses the RTU binary frame:
//! ```text
//! ┌─────────┬──────────┬─────────────┬──────────────┐
//! │ ADDRESS │ FUNCTION │ DATA        │ CRC-16       │
//! │ 1B      │ 1B       │ 0–252B      │ 2B (LE)      │
//! └─────────┴──────────┴─────────────┴──────────────┘
//! ```
//!
//! RTU has no start byte; frames are delimited by silence on the line. The
//! [`FrameReceiver`] combines the known request length of each function
//! with an inter-frame gap timer.
//!
//! # Layers
//!
//! - [`frame`] - byte framing and CRC check
//! - [`pdu`] - request decoding and response building
//! - [`bank`] - the four register banks
//! - [`slave`] - request dispatch against a bank
//! - [`map`] - the supervisor register map

#![no_std]
#![deny(unsafe_code)]

pub mod bank;
pub mod crc;
pub mod frame;
pub mod map;
pub mod pdu;
pub mod slave;

pub use bank::RegisterBank;
pub use frame::{
    Frame, FrameError, FrameReceiver, BROADCAST_ADDRESS, INTER_FRAME_GAP_MS, MAX_DATA_SIZE,
    MAX_FRAME_SIZE,
};
pub use map::SupervisorBank;
pub use pdu::{ExceptionCode, FunctionCode, Request};
pub use slave::{Dispatch, Slave};
