//! Type-length-value codec used for every Sign-On Basic message.
//!
//! Types and lengths use the NDN variable-size number encoding: values below 253
//! take one byte, larger values a one-byte marker followed by a 2 or 4 byte
//! big-endian integer.
//!
//! The encoder never writes past its buffer. Callers probe the block size first
//! and refuse to start writing when it does not fit, so an encode either writes
//! the whole block or nothing.
//!
//! Sign-On Basic 消息使用的 TLV 编解码器。

use crate::error::BufferTooShort;
use thiserror::Error;

const MARKER_U16: u8 = 253;
const MARKER_U32: u8 = 254;
const MARKER_U64: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TlvError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("expected TLV type {expected}, found {found}")]
    WrongType { expected: u32, found: u32 },

    #[error("declared length {declared} exceeds the {remaining} bytes remaining")]
    LengthOverrun { declared: usize, remaining: usize },

    #[error("variable-size number does not fit in 32 bits")]
    NumberTooLarge,

    #[error("{0} unexpected bytes after the last block")]
    TrailingBytes(usize),
}

/// Number of bytes `value` takes as a variable-size number.
pub const fn var_size(value: u32) -> usize {
    if value < MARKER_U16 as u32 {
        1
    } else if value <= u16::MAX as u32 {
        3
    } else {
        5
    }
}

/// Number of bytes a complete block of type `tlv_type` with a `value_len` byte
/// value takes.
pub const fn probe_block_size(tlv_type: u32, value_len: usize) -> usize {
    var_size(tlv_type) + var_size(value_len as u32) + value_len
}

/// Appends a variable-size number to a growable buffer.
pub fn push_var(out: &mut Vec<u8>, value: u32) {
    if value < MARKER_U16 as u32 {
        out.push(value as u8);
    } else if value <= u16::MAX as u32 {
        out.push(MARKER_U16);
        out.extend_from_slice(&(value as u16).to_be_bytes());
    } else {
        out.push(MARKER_U32);
        out.extend_from_slice(&value.to_be_bytes());
    }
}

/// Appends a whole block to a growable buffer.
pub fn push_block(out: &mut Vec<u8>, tlv_type: u32, value: &[u8]) {
    push_var(out, tlv_type);
    push_var(out, value.len() as u32);
    out.extend_from_slice(value);
}

/// Writes TLV blocks into a caller-supplied buffer.
#[derive(Debug)]
pub struct Encoder<'a> {
    output: &'a mut [u8],
    offset: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(output: &'a mut [u8]) -> Self {
        Self { output, offset: 0 }
    }

    /// Bytes written so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.output.len() - self.offset
    }

    /// Fails without writing if fewer than `required` bytes are left.
    pub fn reserve(&self, required: usize) -> Result<(), BufferTooShort> {
        if required > self.remaining() {
            return Err(BufferTooShort {
                required: self.offset + required,
                available: self.output.len(),
            });
        }
        Ok(())
    }

    pub fn append_var(&mut self, value: u32) -> Result<(), BufferTooShort> {
        self.reserve(var_size(value))?;
        let out = &mut self.output[self.offset..];
        if value < MARKER_U16 as u32 {
            out[0] = value as u8;
        } else if value <= u16::MAX as u32 {
            out[0] = MARKER_U16;
            out[1..3].copy_from_slice(&(value as u16).to_be_bytes());
        } else {
            out[0] = MARKER_U32;
            out[1..5].copy_from_slice(&value.to_be_bytes());
        }
        self.offset += var_size(value);
        Ok(())
    }

    pub fn append_type(&mut self, tlv_type: u32) -> Result<(), BufferTooShort> {
        self.append_var(tlv_type)
    }

    pub fn append_length(&mut self, len: usize) -> Result<(), BufferTooShort> {
        self.append_var(len as u32)
    }

    pub fn append_raw(&mut self, bytes: &[u8]) -> Result<(), BufferTooShort> {
        self.reserve(bytes.len())?;
        self.output[self.offset..self.offset + bytes.len()].copy_from_slice(bytes);
        self.offset += bytes.len();
        Ok(())
    }

    /// Appends a whole block. Checks the full size up front.
    pub fn append_block(&mut self, tlv_type: u32, value: &[u8]) -> Result<(), BufferTooShort> {
        self.reserve(probe_block_size(tlv_type, value.len()))?;
        self.append_type(tlv_type)?;
        self.append_length(value.len())?;
        self.append_raw(value)
    }
}

/// A decoded block borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    pub tlv_type: u32,
    pub value: &'a [u8],
    /// Offset of the block's first type byte within the decoder input.
    pub offset: usize,
}

/// Reads TLV blocks from a byte slice.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    input: &'a [u8],
    offset: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.input.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TlvError> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.input.len())
            .ok_or(TlvError::UnexpectedEnd)?;
        let bytes = &self.input[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    pub fn get_var(&mut self) -> Result<u32, TlvError> {
        let first = self.take(1)?[0];
        match first {
            MARKER_U16 => {
                let bytes = self.take(2)?;
                Ok(u16::from_be_bytes([bytes[0], bytes[1]]) as u32)
            }
            MARKER_U32 => {
                let bytes = self.take(4)?;
                Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            MARKER_U64 => Err(TlvError::NumberTooLarge),
            small => Ok(small as u32),
        }
    }

    pub fn get_type(&mut self) -> Result<u32, TlvError> {
        self.get_var()
    }

    pub fn get_length(&mut self) -> Result<usize, TlvError> {
        self.get_var().map(|len| len as usize)
    }

    /// Reads the next complete block.
    ///
    /// On error the decoder position is left where it was.
    pub fn get_block(&mut self) -> Result<Block<'a>, TlvError> {
        let start = self.offset;
        let result = self.read_block(start);
        if result.is_err() {
            self.offset = start;
        }
        result
    }

    fn read_block(&mut self, start: usize) -> Result<Block<'a>, TlvError> {
        let tlv_type = self.get_type()?;
        let len = self.get_length()?;
        let remaining = self.input.len() - self.offset;
        if len > remaining {
            return Err(TlvError::LengthOverrun {
                declared: len,
                remaining,
            });
        }
        let value = self.take(len)?;
        Ok(Block {
            tlv_type,
            value,
            offset: start,
        })
    }

    /// Reads the next block and checks its type.
    pub fn expect_block(&mut self, tlv_type: u32) -> Result<Block<'a>, TlvError> {
        let block = self.get_block()?;
        if block.tlv_type != tlv_type {
            return Err(TlvError::WrongType {
                expected: tlv_type,
                found: block.tlv_type,
            });
        }
        Ok(block)
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<Block<'a>, TlvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }
        let item = self.get_block();
        if item.is_err() {
            // Stop after the first error instead of looping on it.
            self.offset = self.input.len();
        }
        Some(item)
    }
}

/// Finds the first block of `tlv_type` among the blocks in `value`.
pub fn find(value: &[u8], tlv_type: u32) -> Result<Option<Block<'_>>, TlvError> {
    for block in Decoder::new(value) {
        let block = block?;
        if block.tlv_type == tlv_type {
            return Ok(Some(block));
        }
    }
    Ok(None)
}
