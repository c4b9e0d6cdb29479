//! RTU frame encoding and decoding.
//!
//! Frame format:
//! - ADDRESS (1 byte): slave address, 0 for broadcast
//! - FUNCTION (1 byte): function code, high bit set on exception replies
//! - DATA (0-252 bytes): function-specific data, big-endian fields
//! - CRC (2 bytes): CRC-16/MODBUS over ADDRESS..DATA, low byte first

use heapless::Vec;

use crate::crc;
use crate::pdu::FunctionCode;

/// Broadcast slave address; writes are executed but never answered
pub const BROADCAST_ADDRESS: u8 = 0;

/// Maximum data size in bytes
pub const MAX_DATA_SIZE: usize = 252;

/// Maximum complete frame size (ADDRESS + FUNCTION + MAX_DATA + CRC)
pub const MAX_FRAME_SIZE: usize = 1 + 1 + MAX_DATA_SIZE + 2;

/// Minimum complete frame size (ADDRESS + FUNCTION + CRC)
pub const MIN_FRAME_SIZE: usize = 4;

/// Silence that terminates a frame, in milliseconds.
///
/// 3.5 character times at 19200 baud is about 1.8 ms; the bound is rounded
/// up to the millisecond clock resolution plus one tick of jitter.
pub const INTER_FRAME_GAP_MS: u32 = 4;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Frame ended before it was complete
    TooShort,
    /// CRC mismatch
    InvalidCrc,
    /// Function code has no known request length
    UnsupportedFunction,
    /// More bytes than the largest legal frame
    Overrun,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Slave address
    pub address: u8,
    /// Function code
    pub function: u8,
    /// Data between function code and CRC
    pub data: Vec<u8, MAX_DATA_SIZE>,
}

impl Frame {
    /// Create a new frame with the given address, function and data
    pub fn new(address: u8, function: u8, data: &[u8]) -> Result<Self, FrameError> {
        let mut data_vec = Vec::new();
        data_vec
            .extend_from_slice(data)
            .map_err(|_| FrameError::BufferTooSmall)?;

        Ok(Self {
            address,
            function,
            data: data_vec,
        })
    }

    /// Decode a complete frame including its CRC
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < MIN_FRAME_SIZE {
            return Err(FrameError::TooShort);
        }
        if bytes.len() > MAX_FRAME_SIZE {
            return Err(FrameError::Overrun);
        }
        if !crc::verify(bytes) {
            return Err(FrameError::InvalidCrc);
        }
        Self::new(bytes[0], bytes[1], &bytes[2..bytes.len() - 2])
    }

    /// True when addressed to every slave
    pub fn is_broadcast(&self) -> bool {
        self.address == BROADCAST_ADDRESS
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let body_len = 2 + self.data.len();
        let frame_len = body_len + 2;
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = self.address;
        buffer[1] = self.function;
        buffer[2..body_len].copy_from_slice(&self.data);
        let crc = crc::checksum(&buffer[..body_len]).to_le_bytes();
        buffer[body_len] = crc[0];
        buffer[body_len + 1] = crc[1];

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// Length of a request frame, judged from its leading bytes.
///
/// Returns `Ok(None)` while the header is still too short to tell, and
/// `Err(UnsupportedFunction)` when the function code has no known layout.
pub fn request_length(header: &[u8]) -> Result<Option<usize>, FrameError> {
    let Some(&function) = header.get(1) else {
        return Ok(None);
    };
    match FunctionCode::from_u8(function) {
        Some(
            FunctionCode::ReadCoils
            | FunctionCode::ReadDiscreteInputs
            | FunctionCode::ReadHoldingRegisters
            | FunctionCode::ReadInputRegisters
            | FunctionCode::WriteSingleCoil
            | FunctionCode::WriteSingleRegister,
        ) => Ok(Some(8)),
        Some(FunctionCode::WriteMultipleCoils | FunctionCode::WriteMultipleRegisters) => {
            // address, function, start(2), quantity(2), byte count
            Ok(header.get(6).map(|&count| 7 + count as usize + 2))
        }
        None => Err(FrameError::UnsupportedFunction),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiveState {
    /// Waiting for enough header bytes to know the length
    Header,
    /// Length known, collecting bytes
    Fixed(usize),
    /// Unknown function, frame ends at the next gap
    UntilGap,
}

/// Byte-at-a-time RTU receiver
///
/// Frames complete either when the expected request length is reached, or,
/// for function codes it does not know, when the line has been silent for
/// longer than the inter-frame gap. A gap inside a known-length frame
/// discards the partial frame.
#[derive(Debug, Clone)]
pub struct FrameReceiver {
    state: ReceiveState,
    buffer: Vec<u8, MAX_FRAME_SIZE>,
    last_byte_ms: u32,
    gap_ms: u32,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReceiver {
    /// Create a receiver using [`INTER_FRAME_GAP_MS`]
    pub fn new() -> Self {
        Self::with_gap(INTER_FRAME_GAP_MS)
    }

    /// Create a receiver with a custom inter-frame gap
    pub fn with_gap(gap_ms: u32) -> Self {
        Self {
            state: ReceiveState::Header,
            buffer: Vec::new(),
            last_byte_ms: 0,
            gap_ms,
        }
    }

    /// Reset the receiver state
    pub fn reset(&mut self) {
        self.state = ReceiveState::Header;
        self.buffer.clear();
    }

    /// Bytes of the frame collected so far
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a single byte received at `now_ms`
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` when a frame was
    /// dropped. If the byte arrives after a gap, the previous partial frame
    /// is flushed first and its result is returned; the byte then starts a
    /// new frame.
    pub fn feed(&mut self, byte: u8, now_ms: u32) -> Result<Option<Frame>, FrameError> {
        let flushed = if self.gap_elapsed(now_ms) {
            self.flush()
        } else {
            Ok(None)
        };
        self.last_byte_ms = now_ms;

        if self.buffer.push(byte).is_err() {
            self.reset();
            return Err(FrameError::Overrun);
        }

        if self.state == ReceiveState::Header {
            self.state = match request_length(&self.buffer) {
                Ok(Some(len)) if len > MAX_FRAME_SIZE => {
                    self.reset();
                    return Err(FrameError::Overrun);
                }
                Ok(Some(len)) => ReceiveState::Fixed(len),
                Ok(None) => ReceiveState::Header,
                Err(_) => ReceiveState::UntilGap,
            };
        }

        match self.state {
            ReceiveState::Fixed(len) if self.buffer.len() >= len => {
                // A byte completing a frame never follows a flush: flushing
                // leaves a single byte and no frame is that short.
                let result = Frame::decode(&self.buffer);
                self.reset();
                result.map(Some)
            }
            _ => flushed,
        }
    }

    /// Feed multiple bytes received together at `now_ms`
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8], now_ms: u32) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte, now_ms)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    /// Check for line silence without new bytes
    ///
    /// Completes a pending unknown-function frame, or drops a truncated one
    /// with [`FrameError::TooShort`], once the gap has elapsed.
    pub fn poll(&mut self, now_ms: u32) -> Result<Option<Frame>, FrameError> {
        if self.gap_elapsed(now_ms) {
            self.flush()
        } else {
            Ok(None)
        }
    }

    fn gap_elapsed(&self, now_ms: u32) -> bool {
        !self.buffer.is_empty() && now_ms.wrapping_sub(self.last_byte_ms) > self.gap_ms
    }

    fn flush(&mut self) -> Result<Option<Frame>, FrameError> {
        let result = match self.state {
            ReceiveState::UntilGap => Frame::decode(&self.buffer).map(Some),
            ReceiveState::Header | ReceiveState::Fixed(_) => Err(FrameError::TooShort),
        };
        self.reset();
        result
    }
}
