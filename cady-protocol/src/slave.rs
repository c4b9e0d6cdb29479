//! Request dispatch
//!
//! Applies decoded requests to a [`RegisterBank`] and builds the reply
//! frame. The master may read every bank but write only coils and holding
//! registers; discrete inputs and input registers have no write function.

use crate::bank::RegisterBank;
use crate::frame::Frame;
use crate::pdu::{self, ExceptionCode, FunctionCode, Request};

/// What the slave did with a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Reply must be sent to the master
    Respond(Frame),
    /// Broadcast executed, no reply allowed
    Executed,
    /// Frame addressed to another slave
    Ignored,
}

/// A Modbus slave with a fixed address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Slave {
    address: u8,
}

impl Slave {
    /// Create a slave answering to `address`
    pub const fn new(address: u8) -> Self {
        Self { address }
    }

    /// Slave address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Execute a frame against the bank
    pub fn handle<const C: usize, const D: usize, const H: usize, const I: usize>(
        &self,
        bank: &mut RegisterBank<C, D, H, I>,
        frame: &Frame,
    ) -> Dispatch {
        let broadcast = frame.is_broadcast();
        if !broadcast && frame.address != self.address {
            return Dispatch::Ignored;
        }

        let reply = match Request::decode(frame) {
            // Broadcast reads make no sense and are dropped like bad requests
            Ok(request) if broadcast && !request.function().is_write() => {
                return Dispatch::Executed;
            }
            Ok(request) => self.execute(bank, request),
            Err(code) => Err(code),
        };

        if broadcast {
            return Dispatch::Executed;
        }

        let frame = match reply {
            Ok(frame) => frame,
            Err(code) => pdu::exception_response(self.address, frame.function, code),
        };
        Dispatch::Respond(frame)
    }

    fn execute<const C: usize, const D: usize, const H: usize, const I: usize>(
        &self,
        bank: &mut RegisterBank<C, D, H, I>,
        request: Request<'_>,
    ) -> Result<Frame, ExceptionCode> {
        let address = self.address;
        let function = request.function();
        // A reply that does not fit a frame is a request too large to serve
        let too_large = |_| ExceptionCode::IllegalDataValue;

        match request {
            Request::ReadCoils { address: start, quantity } => {
                let bits = bank.coils(start, quantity)?;
                pdu::bits_response(address, function, bits.iter().copied()).map_err(too_large)
            }
            Request::ReadDiscreteInputs { address: start, quantity } => {
                let bits = bank.discrete_inputs(start, quantity)?;
                pdu::bits_response(address, function, bits.iter().copied()).map_err(too_large)
            }
            Request::ReadHoldingRegisters { address: start, quantity } => {
                let registers = bank.holding_registers(start, quantity)?;
                pdu::registers_response(address, function, registers.iter().copied())
                    .map_err(too_large)
            }
            Request::ReadInputRegisters { address: start, quantity } => {
                let registers = bank.input_registers(start, quantity)?;
                pdu::registers_response(address, function, registers.iter().copied())
                    .map_err(too_large)
            }
            Request::WriteSingleCoil { address: start, value } => {
                bank.write_coils(start, 1, &[value as u8])?;
                let field = if value { pdu::COIL_ON } else { pdu::COIL_OFF };
                pdu::write_response(address, function, start, field).map_err(too_large)
            }
            Request::WriteSingleRegister { address: start, value } => {
                bank.write_holding(start, 1, &value.to_be_bytes())?;
                pdu::write_response(address, function, start, value).map_err(too_large)
            }
            Request::WriteMultipleCoils { address: start, quantity, values } => {
                bank.write_coils(start, quantity, values)?;
                pdu::write_response(address, FunctionCode::WriteMultipleCoils, start, quantity)
                    .map_err(too_large)
            }
            Request::WriteMultipleRegisters { address: start, quantity, values } => {
                bank.write_holding(start, quantity, values)?;
                pdu::write_response(address, FunctionCode::WriteMultipleRegisters, start, quantity)
                    .map_err(too_large)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{coil, discrete, holding, SupervisorBank, SLAVE_ADDRESS};

    fn request(address: u8, function: u8, data: &[u8]) -> Frame {
        Frame::new(address, function, data).unwrap()
    }

    fn respond(slave: &Slave, bank: &mut SupervisorBank, frame: &Frame) -> Frame {
        match slave.handle(bank, frame) {
            Dispatch::Respond(frame) => frame,
            other => panic!("expected a reply, got {:?}", other),
        }
    }

    #[test]
    fn test_write_single_coil_and_echo() {
        let slave = Slave::new(SLAVE_ADDRESS);
        let mut bank = SupervisorBank::new();

        let req = request(1, 0x05, &[0x00, 0x00, 0xFF, 0x00]);
        let reply = respond(&slave, &mut bank, &req);

        assert_eq!(reply, req);
        assert!(bank.coil(coil::SHUTDOWN_FLAG));
    }

    #[test]
    fn test_read_discrete_input() {
        let slave = Slave::new(SLAVE_ADDRESS);
        let mut bank = SupervisorBank::new();
        bank.set_discrete_input(discrete::SHUTDOWN_REQUEST, true);

        let reply = respond(&slave, &mut bank, &request(1, 0x02, &[0, 0, 0, 1]));
        assert_eq!(reply.function, 0x02);
        assert_eq!(&reply.data[..], &[1, 0x01]);
    }

    #[test]
    fn test_read_holding_registers() {
        let slave = Slave::new(SLAVE_ADDRESS);
        let mut bank = SupervisorBank::new();
        bank.set_holding(holding::SBC_HEARTBEAT, 0x0102);
        bank.set_holding(holding::JOY1_BRIGHTNESS, 200);

        let reply = respond(&slave, &mut bank, &request(1, 0x03, &[0, 0, 0, 2]));
        assert_eq!(&reply.data[..], &[4, 0x01, 0x02, 0x00, 200]);
    }

    #[test]
    fn test_out_of_range_read_is_illegal_address() {
        let slave = Slave::new(SLAVE_ADDRESS);
        let mut bank = SupervisorBank::new();

        let reply = respond(&slave, &mut bank, &request(1, 0x04, &[0, 1, 0, 2]));
        assert_eq!(reply.function, 0x84);
        assert_eq!(&reply.data[..], &[ExceptionCode::IllegalDataAddress as u8]);
    }

    #[test]
    fn test_unknown_function_is_illegal_function() {
        let slave = Slave::new(SLAVE_ADDRESS);
        let mut bank = SupervisorBank::new();

        let reply = respond(&slave, &mut bank, &request(1, 0x07, &[]));
        assert_eq!(reply.function, 0x87);
        assert_eq!(&reply.data[..], &[0x01]);
    }

    #[test]
    fn test_write_multiple_registers() {
        let slave = Slave::new(SLAVE_ADDRESS);
        let mut bank = SupervisorBank::new();

        let req = request(1, 0x10, &[0, 1, 0, 2, 4, 0, 10, 0, 20]);
        let reply = respond(&slave, &mut bank, &req);

        assert_eq!(&reply.data[..], &[0, 1, 0, 2]);
        assert_eq!(bank.holding(holding::JOY1_BRIGHTNESS), 10);
        assert_eq!(bank.holding(holding::JOY2_BRIGHTNESS), 20);
    }

    #[test]
    fn test_write_multiple_coils() {
        let slave = Slave::new(SLAVE_ADDRESS);
        let mut bank = SupervisorBank::new();

        let reply = respond(&slave, &mut bank, &request(1, 0x0F, &[0, 0, 0, 4, 1, 0b1010]));
        assert_eq!(&reply.data[..], &[0, 0, 0, 4]);
        assert!(!bank.coil(coil::SHUTDOWN_FLAG));
        assert!(bank.coil(coil::DISPLAY_STATE));
        assert!(bank.coil(coil::JOY2_ENABLE));
    }

    #[test]
    fn test_other_address_ignored() {
        let slave = Slave::new(SLAVE_ADDRESS);
        let mut bank = SupervisorBank::new();

        let dispatch = slave.handle(&mut bank, &request(2, 0x05, &[0, 0, 0xFF, 0]));
        assert_eq!(dispatch, Dispatch::Ignored);
        assert!(!bank.coil(coil::SHUTDOWN_FLAG));
    }

    #[test]
    fn test_broadcast_write_executes_without_reply() {
        let slave = Slave::new(SLAVE_ADDRESS);
        let mut bank = SupervisorBank::new();

        let dispatch = slave.handle(&mut bank, &request(0, 0x06, &[0, 1, 0, 99]));
        assert_eq!(dispatch, Dispatch::Executed);
        assert_eq!(bank.holding(holding::JOY1_BRIGHTNESS), 99);

        // Broadcast errors stay silent too
        let dispatch = slave.handle(&mut bank, &request(0, 0x06, &[0, 9, 0, 1]));
        assert_eq!(dispatch, Dispatch::Executed);
    }
}
