//! CRC-16/MODBUS checksum
//!
//! Polynomial 0x8005 (reflected 0xA001), initial value 0xFFFF. The CRC is
//! transmitted low byte first, unlike every other 16-bit field in the frame.

use crc::{Crc, CRC_16_MODBUS};

const MODBUS_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Compute the CRC over `bytes`
pub fn checksum(bytes: &[u8]) -> u16 {
    MODBUS_CRC.checksum(bytes)
}

/// Check the trailing two CRC bytes of a complete frame
pub fn verify(frame: &[u8]) -> bool {
    if frame.len() < 2 {
        return false;
    }
    let (body, tail) = frame.split_at(frame.len() - 2);
    u16::from_le_bytes([tail[0], tail[1]]) == checksum(body)
}
