//! The four Modbus register banks
//!
//! Coils and holding registers are written by the master; discrete inputs
//! and input registers are written only locally by the slave. Each bank is
//! addressed from 0 independently of the others.

use core::ops::Range;

use crate::pdu::ExceptionCode;

/// Fixed-size register storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterBank<
    const COILS: usize,
    const DISCRETE: usize,
    const HOLDING: usize,
    const INPUT: usize,
> {
    coils: [bool; COILS],
    discrete_inputs: [bool; DISCRETE],
    holding: [u16; HOLDING],
    input: [u16; INPUT],
}

impl<const C: usize, const D: usize, const H: usize, const I: usize> Default
    for RegisterBank<C, D, H, I>
{
    fn default() -> Self {
        Self::new()
    }
}

/// Validate `address..address + quantity` against a bank of `len` entries
pub fn checked_range(len: usize, address: u16, quantity: u16) -> Result<Range<usize>, ExceptionCode> {
    let start = address as usize;
    let end = start + quantity as usize;
    if end > len {
        return Err(ExceptionCode::IllegalDataAddress);
    }
    Ok(start..end)
}

impl<const C: usize, const D: usize, const H: usize, const I: usize> RegisterBank<C, D, H, I> {
    /// Create a bank with every value cleared
    pub const fn new() -> Self {
        Self {
            coils: [false; C],
            discrete_inputs: [false; D],
            holding: [0; H],
            input: [0; I],
        }
    }

    /// Read a coil; out-of-range reads as off
    pub fn coil(&self, index: usize) -> bool {
        self.coils.get(index).copied().unwrap_or(false)
    }

    /// Read a discrete input; out-of-range reads as off
    pub fn discrete_input(&self, index: usize) -> bool {
        self.discrete_inputs.get(index).copied().unwrap_or(false)
    }

    /// Read a holding register; out-of-range reads as 0
    pub fn holding(&self, index: usize) -> u16 {
        self.holding.get(index).copied().unwrap_or(0)
    }

    /// Read an input register; out-of-range reads as 0
    pub fn input(&self, index: usize) -> u16 {
        self.input.get(index).copied().unwrap_or(0)
    }

    /// Set a discrete input (local side)
    pub fn set_discrete_input(&mut self, index: usize, value: bool) {
        if let Some(slot) = self.discrete_inputs.get_mut(index) {
            *slot = value;
        }
    }

    /// Set an input register (local side)
    pub fn set_input(&mut self, index: usize, value: u16) {
        if let Some(slot) = self.input.get_mut(index) {
            *slot = value;
        }
    }

    /// Set a coil; used by the slave and for seeding in tests
    pub fn set_coil(&mut self, index: usize, value: bool) {
        if let Some(slot) = self.coils.get_mut(index) {
            *slot = value;
        }
    }

    /// Set a holding register; used by the slave and for seeding in tests
    pub fn set_holding(&mut self, index: usize, value: u16) {
        if let Some(slot) = self.holding.get_mut(index) {
            *slot = value;
        }
    }

    /// Coils in a requested range
    pub fn coils(&self, address: u16, quantity: u16) -> Result<&[bool], ExceptionCode> {
        Ok(&self.coils[checked_range(C, address, quantity)?])
    }

    /// Discrete inputs in a requested range
    pub fn discrete_inputs(&self, address: u16, quantity: u16) -> Result<&[bool], ExceptionCode> {
        Ok(&self.discrete_inputs[checked_range(D, address, quantity)?])
    }

    /// Holding registers in a requested range
    pub fn holding_registers(&self, address: u16, quantity: u16) -> Result<&[u16], ExceptionCode> {
        Ok(&self.holding[checked_range(H, address, quantity)?])
    }

    /// Input registers in a requested range
    pub fn input_registers(&self, address: u16, quantity: u16) -> Result<&[u16], ExceptionCode> {
        Ok(&self.input[checked_range(I, address, quantity)?])
    }

    /// Write `quantity` coils from LSB-first packed bytes
    pub fn write_coils(
        &mut self,
        address: u16,
        quantity: u16,
        packed: &[u8],
    ) -> Result<(), ExceptionCode> {
        let range = checked_range(C, address, quantity)?;
        for (i, slot) in self.coils[range].iter_mut().enumerate() {
            let byte = packed.get(i / 8).ok_or(ExceptionCode::IllegalDataValue)?;
            *slot = byte & (1 << (i % 8)) != 0;
        }
        Ok(())
    }

    /// Write `quantity` holding registers from big-endian bytes
    pub fn write_holding(
        &mut self,
        address: u16,
        quantity: u16,
        bytes: &[u8],
    ) -> Result<(), ExceptionCode> {
        let range = checked_range(H, address, quantity)?;
        if bytes.len() < range.len() * 2 {
            return Err(ExceptionCode::IllegalDataValue);
        }
        for (slot, pair) in self.holding[range].iter_mut().zip(bytes.chunks_exact(2)) {
            *slot = u16::from_be_bytes([pair[0], pair[1]]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBank = RegisterBank<4, 1, 3, 2>;

    #[test]
    fn test_new_bank_is_cleared() {
        let bank = TestBank::new();
        assert_eq!(bank.coils(0, 4), Ok(&[false; 4][..]));
        assert_eq!(bank.holding_registers(0, 3), Ok(&[0u16; 3][..]));
    }

    #[test]
    fn test_range_checks() {
        let bank = TestBank::new();
        assert!(bank.coils(3, 1).is_ok());
        assert_eq!(bank.coils(3, 2), Err(ExceptionCode::IllegalDataAddress));
        assert_eq!(
            bank.discrete_inputs(1, 1),
            Err(ExceptionCode::IllegalDataAddress)
        );
        assert_eq!(
            bank.input_registers(0xFFFF, 1),
            Err(ExceptionCode::IllegalDataAddress)
        );
    }

    #[test]
    fn test_write_coils_unpacks_lsb_first() {
        let mut bank = TestBank::new();
        bank.write_coils(1, 3, &[0b101]).unwrap();
        assert!(!bank.coil(0));
        assert!(bank.coil(1));
        assert!(!bank.coil(2));
        assert!(bank.coil(3));
    }

    #[test]
    fn test_write_holding_big_endian() {
        let mut bank = TestBank::new();
        bank.write_holding(1, 2, &[0x00, 0xC8, 0x01, 0x00]).unwrap();
        assert_eq!(bank.holding(1), 200);
        assert_eq!(bank.holding(2), 256);
    }

    #[test]
    fn test_out_of_range_scalar_access() {
        let mut bank = TestBank::new();
        bank.set_input(9, 5);
        assert_eq!(bank.input(9), 0);
        assert!(!bank.coil(9));
    }
}
