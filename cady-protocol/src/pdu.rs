//! Function codes, request decoding and response building.
//!
//! All 16-bit fields inside the data section are big-endian. Bit values
//! (coils, discrete inputs) are packed LSB-first, eight per byte.

use crate::frame::{Frame, FrameError};

/// Largest quantity of bits a single read may request
pub const MAX_READ_BITS: u16 = 2000;

/// Largest quantity of registers a single read may request
pub const MAX_READ_REGISTERS: u16 = 125;

/// Largest quantity of coils a single write may carry
pub const MAX_WRITE_COILS: u16 = 1968;

/// Largest quantity of registers a single write may carry
pub const MAX_WRITE_REGISTERS: u16 = 123;

/// Coil value meaning "on" in a write-single-coil request
pub const COIL_ON: u16 = 0xFF00;

/// Coil value meaning "off" in a write-single-coil request
pub const COIL_OFF: u16 = 0x0000;

/// Bit set in the function byte of an exception response
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Supported function codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FunctionCode {
    ReadCoils = 0x01,
    ReadDiscreteInputs = 0x02,
    ReadHoldingRegisters = 0x03,
    ReadInputRegisters = 0x04,
    WriteSingleCoil = 0x05,
    WriteSingleRegister = 0x06,
    WriteMultipleCoils = 0x0F,
    WriteMultipleRegisters = 0x10,
}

impl FunctionCode {
    /// Parse a function code byte
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::ReadCoils),
            0x02 => Some(Self::ReadDiscreteInputs),
            0x03 => Some(Self::ReadHoldingRegisters),
            0x04 => Some(Self::ReadInputRegisters),
            0x05 => Some(Self::WriteSingleCoil),
            0x06 => Some(Self::WriteSingleRegister),
            0x0F => Some(Self::WriteMultipleCoils),
            0x10 => Some(Self::WriteMultipleRegisters),
            _ => None,
        }
    }

    /// True for functions that modify the bank
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Self::WriteSingleCoil
                | Self::WriteSingleRegister
                | Self::WriteMultipleCoils
                | Self::WriteMultipleRegisters
        )
    }
}

/// Modbus exception codes returned to the master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ExceptionCode {
    /// Function code not supported
    IllegalFunction = 0x01,
    /// Address range outside the bank
    IllegalDataAddress = 0x02,
    /// Bad quantity, coil value or byte count
    IllegalDataValue = 0x03,
}

/// A decoded request, borrowing packed values from the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    ReadCoils { address: u16, quantity: u16 },
    ReadDiscreteInputs { address: u16, quantity: u16 },
    ReadHoldingRegisters { address: u16, quantity: u16 },
    ReadInputRegisters { address: u16, quantity: u16 },
    WriteSingleCoil { address: u16, value: bool },
    WriteSingleRegister { address: u16, value: u16 },
    /// `values` holds `quantity` bits packed LSB-first
    WriteMultipleCoils { address: u16, quantity: u16, values: &'a [u8] },
    /// `values` holds `quantity` big-endian registers
    WriteMultipleRegisters { address: u16, quantity: u16, values: &'a [u8] },
}

fn be_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

impl<'a> Request<'a> {
    /// Decode the data section of a frame
    ///
    /// Quantity limits are checked here; address ranges are checked by the
    /// bank, since only it knows its size.
    pub fn decode(frame: &'a Frame) -> Result<Self, ExceptionCode> {
        let function =
            FunctionCode::from_u8(frame.function).ok_or(ExceptionCode::IllegalFunction)?;
        let data = &frame.data[..];

        match function {
            FunctionCode::WriteMultipleCoils | FunctionCode::WriteMultipleRegisters => {
                if data.len() < 5 {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                let address = be_u16(data, 0);
                let quantity = be_u16(data, 2);
                let byte_count = data[4] as usize;
                let values = &data[5..];

                let (limit, expected_bytes) = if function == FunctionCode::WriteMultipleCoils {
                    (MAX_WRITE_COILS, (quantity as usize).div_ceil(8))
                } else {
                    (MAX_WRITE_REGISTERS, quantity as usize * 2)
                };
                if quantity == 0
                    || quantity > limit
                    || byte_count != expected_bytes
                    || values.len() != byte_count
                {
                    return Err(ExceptionCode::IllegalDataValue);
                }

                Ok(if function == FunctionCode::WriteMultipleCoils {
                    Self::WriteMultipleCoils { address, quantity, values }
                } else {
                    Self::WriteMultipleRegisters { address, quantity, values }
                })
            }
            _ => {
                if data.len() != 4 {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                let address = be_u16(data, 0);
                let field = be_u16(data, 2);
                let check_quantity = |limit: u16| {
                    if field == 0 || field > limit {
                        Err(ExceptionCode::IllegalDataValue)
                    } else {
                        Ok(field)
                    }
                };

                match function {
                    FunctionCode::ReadCoils => Ok(Self::ReadCoils {
                        address,
                        quantity: check_quantity(MAX_READ_BITS)?,
                    }),
                    FunctionCode::ReadDiscreteInputs => Ok(Self::ReadDiscreteInputs {
                        address,
                        quantity: check_quantity(MAX_READ_BITS)?,
                    }),
                    FunctionCode::ReadHoldingRegisters => Ok(Self::ReadHoldingRegisters {
                        address,
                        quantity: check_quantity(MAX_READ_REGISTERS)?,
                    }),
                    FunctionCode::ReadInputRegisters => Ok(Self::ReadInputRegisters {
                        address,
                        quantity: check_quantity(MAX_READ_REGISTERS)?,
                    }),
                    FunctionCode::WriteSingleCoil => match field {
                        COIL_ON => Ok(Self::WriteSingleCoil { address, value: true }),
                        COIL_OFF => Ok(Self::WriteSingleCoil { address, value: false }),
                        _ => Err(ExceptionCode::IllegalDataValue),
                    },
                    FunctionCode::WriteSingleRegister => {
                        Ok(Self::WriteSingleRegister { address, value: field })
                    }
                    FunctionCode::WriteMultipleCoils | FunctionCode::WriteMultipleRegisters => {
                        Err(ExceptionCode::IllegalFunction)
                    }
                }
            }
        }
    }

    /// Function code of this request
    pub fn function(&self) -> FunctionCode {
        match self {
            Self::ReadCoils { .. } => FunctionCode::ReadCoils,
            Self::ReadDiscreteInputs { .. } => FunctionCode::ReadDiscreteInputs,
            Self::ReadHoldingRegisters { .. } => FunctionCode::ReadHoldingRegisters,
            Self::ReadInputRegisters { .. } => FunctionCode::ReadInputRegisters,
            Self::WriteSingleCoil { .. } => FunctionCode::WriteSingleCoil,
            Self::WriteSingleRegister { .. } => FunctionCode::WriteSingleRegister,
            Self::WriteMultipleCoils { .. } => FunctionCode::WriteMultipleCoils,
            Self::WriteMultipleRegisters { .. } => FunctionCode::WriteMultipleRegisters,
        }
    }
}

/// Build an exception response for `function`
pub fn exception_response(address: u8, function: u8, code: ExceptionCode) -> Frame {
    Frame {
        address,
        function: function | EXCEPTION_FLAG,
        data: core::iter::once(code as u8).collect(),
    }
}

/// Build a read-bits response from an iterator of bit values
pub fn bits_response(
    address: u8,
    function: FunctionCode,
    bits: impl ExactSizeIterator<Item = bool>,
) -> Result<Frame, FrameError> {
    let byte_count = bits.len().div_ceil(8);
    let mut frame = Frame::new(address, function as u8, &[byte_count as u8])?;
    frame
        .data
        .resize(1 + byte_count, 0)
        .map_err(|_| FrameError::BufferTooSmall)?;
    for (i, bit) in bits.enumerate() {
        if bit {
            frame.data[1 + i / 8] |= 1 << (i % 8);
        }
    }
    Ok(frame)
}

/// Build a read-registers response from an iterator of register values
pub fn registers_response(
    address: u8,
    function: FunctionCode,
    registers: impl ExactSizeIterator<Item = u16>,
) -> Result<Frame, FrameError> {
    let mut frame = Frame::new(address, function as u8, &[(registers.len() * 2) as u8])?;
    for value in registers {
        frame
            .data
            .extend_from_slice(&value.to_be_bytes())
            .map_err(|_| FrameError::BufferTooSmall)?;
    }
    Ok(frame)
}

/// Build the acknowledgement of a write: start address and value/quantity
pub fn write_response(
    address: u8,
    function: FunctionCode,
    start: u16,
    field: u16,
) -> Result<Frame, FrameError> {
    let [a_hi, a_lo] = start.to_be_bytes();
    let [f_hi, f_lo] = field.to_be_bytes();
    Frame::new(address, function as u8, &[a_hi, a_lo, f_hi, f_lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(function: u8, data: &[u8]) -> Frame {
        Frame::new(1, function, data).unwrap()
    }

    #[test]
    fn test_decode_read_requests() {
        let f = frame(0x01, &[0x00, 0x00, 0x00, 0x04]);
        assert_eq!(
            Request::decode(&f),
            Ok(Request::ReadCoils { address: 0, quantity: 4 })
        );

        let f = frame(0x04, &[0x00, 0x01, 0x00, 0x01]);
        assert_eq!(
            Request::decode(&f),
            Ok(Request::ReadInputRegisters { address: 1, quantity: 1 })
        );
    }

    #[test]
    fn test_decode_quantity_limits() {
        let f = frame(0x03, &[0x00, 0x00, 0x00, 0x00]);
        assert_eq!(Request::decode(&f), Err(ExceptionCode::IllegalDataValue));

        let f = frame(0x03, &[0x00, 0x00, 0x00, 126]);
        assert_eq!(Request::decode(&f), Err(ExceptionCode::IllegalDataValue));

        let f = frame(0x02, &[0x00, 0x00, 0x07, 0xD0]);
        assert!(Request::decode(&f).is_ok());
    }

    #[test]
    fn test_decode_single_coil_values() {
        let f = frame(0x05, &[0x00, 0x02, 0xFF, 0x00]);
        assert_eq!(
            Request::decode(&f),
            Ok(Request::WriteSingleCoil { address: 2, value: true })
        );

        let f = frame(0x05, &[0x00, 0x02, 0x00, 0x00]);
        assert_eq!(
            Request::decode(&f),
            Ok(Request::WriteSingleCoil { address: 2, value: false })
        );

        let f = frame(0x05, &[0x00, 0x02, 0x00, 0x01]);
        assert_eq!(Request::decode(&f), Err(ExceptionCode::IllegalDataValue));
    }

    #[test]
    fn test_decode_write_multiple() {
        let f = frame(0x0F, &[0x00, 0x00, 0x00, 0x04, 0x01, 0b0101]);
        assert_eq!(
            Request::decode(&f),
            Ok(Request::WriteMultipleCoils {
                address: 0,
                quantity: 4,
                values: &[0b0101],
            })
        );

        // Byte count disagrees with quantity
        let f = frame(0x10, &[0x00, 0x01, 0x00, 0x02, 0x02, 0x00, 0x10]);
        assert_eq!(Request::decode(&f), Err(ExceptionCode::IllegalDataValue));
    }

    #[test]
    fn test_decode_unknown_function() {
        let f = frame(0x2B, &[0x0E]);
        assert_eq!(Request::decode(&f), Err(ExceptionCode::IllegalFunction));
    }

    #[test]
    fn test_exception_response() {
        let response = exception_response(1, 0x03, ExceptionCode::IllegalDataAddress);
        assert_eq!(response.function, 0x83);
        assert_eq!(&response.data[..], &[0x02]);
    }

    #[test]
    fn test_bits_response_packing() {
        let bits = [true, false, true, true, false, false, false, false, true];
        let response = bits_response(1, FunctionCode::ReadCoils, bits.iter().copied()).unwrap();
        assert_eq!(&response.data[..], &[2, 0b0000_1101, 0b0000_0001]);
    }

    #[test]
    fn test_registers_response() {
        let response =
            registers_response(1, FunctionCode::ReadHoldingRegisters, [0x1234u16, 7].into_iter())
                .unwrap();
        assert_eq!(&response.data[..], &[4, 0x12, 0x34, 0x00, 0x07]);
    }
}
