//! Core types for the CAN codec generator
//!
//! This module defines the error type shared by the whole library and the
//! raw numeric model every generated routine works with: the storage width
//! of a signal's raw value and the raw value itself.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur while generating or running codecs
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Destination or source buffer is shorter than the message.
    /// Recoverable: retry with a large enough buffer.
    #[error("Buffer too small: message needs {required} bytes, buffer has {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    /// The message layout cannot be planned. Raised once, when the codec is
    /// built, never from pack/unpack.
    #[error("Invalid schema for message '{message}': {violation}")]
    InvalidSchema {
        message: String,
        violation: SchemaViolation,
    },

    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CodecError {
    /// True for errors the caller can recover from by supplying a larger buffer
    pub fn is_size_error(&self) -> bool {
        matches!(self, CodecError::BufferTooSmall { .. })
    }

    /// True for layout errors detected while building a codec
    pub fn is_schema_error(&self) -> bool {
        matches!(self, CodecError::InvalidSchema { .. })
    }
}

/// A reason a message layout was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("byte length must be at least 1")]
    EmptyMessage,

    #[error("signal '{signal}' has invalid length {length} (expected 1..=64)")]
    InvalidLength { signal: String, length: u16 },

    #[error("signal '{signal}' has a zero scaling factor")]
    ZeroFactor { signal: String },

    #[error("signal name '{0}' is declared more than once")]
    DuplicateSignal(String),

    #[error("signal '{signal}' addresses byte {byte_index}, message is {byte_length} bytes long")]
    OutOfBounds {
        signal: String,
        byte_index: usize,
        byte_length: usize,
    },

    #[error("signals '{first}' and '{second}' overlap in byte {byte_index} (mask 0x{mask:02X})")]
    Overlap {
        first: String,
        second: String,
        byte_index: usize,
        mask: u8,
    },
}

/// Storage width of a raw value, the smallest of 8/16/32/64 bits that holds
/// the signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RawWidth {
    W8,
    W16,
    W32,
    W64,
}

impl RawWidth {
    /// Minimal covering width for a bit length
    pub fn for_length(bit_length: u16) -> Self {
        match bit_length {
            0..=8 => RawWidth::W8,
            9..=16 => RawWidth::W16,
            17..=32 => RawWidth::W32,
            _ => RawWidth::W64,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            RawWidth::W8 => 8,
            RawWidth::W16 => 16,
            RawWidth::W32 => 32,
            RawWidth::W64 => 64,
        }
    }
}

/// Signedness and width of a signal's raw representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawKind {
    pub signed: bool,
    pub width: RawWidth,
}

impl RawKind {
    pub fn new(signed: bool, bit_length: u16) -> Self {
        Self {
            signed,
            width: RawWidth::for_length(bit_length),
        }
    }

    /// Rust type name of the raw storage, e.g. `u16` or `i32`
    pub fn type_name(&self) -> &'static str {
        match (self.signed, self.width) {
            (false, RawWidth::W8) => "u8",
            (false, RawWidth::W16) => "u16",
            (false, RawWidth::W32) => "u32",
            (false, RawWidth::W64) => "u64",
            (true, RawWidth::W8) => "i8",
            (true, RawWidth::W16) => "i16",
            (true, RawWidth::W32) => "i32",
            (true, RawWidth::W64) => "i64",
        }
    }

    /// Narrow a float to this kind, truncating any fraction toward zero.
    ///
    /// Float to int `as` casts saturate at the bounds of the target type and
    /// map NaN to zero.
    pub fn narrow(&self, value: f64) -> RawValue {
        match (self.signed, self.width) {
            (false, RawWidth::W8) => RawValue::Unsigned(value as u8 as u64),
            (false, RawWidth::W16) => RawValue::Unsigned(value as u16 as u64),
            (false, RawWidth::W32) => RawValue::Unsigned(value as u32 as u64),
            (false, RawWidth::W64) => RawValue::Unsigned(value as u64),
            (true, RawWidth::W8) => RawValue::Signed(value as i8 as i64),
            (true, RawWidth::W16) => RawValue::Signed(value as i16 as i64),
            (true, RawWidth::W32) => RawValue::Signed(value as i32 as i64),
            (true, RawWidth::W64) => RawValue::Signed(value as i64),
        }
    }

    /// Zero value of this kind
    pub fn zero(&self) -> RawValue {
        if self.signed {
            RawValue::Signed(0)
        } else {
            RawValue::Unsigned(0)
        }
    }
}

impl fmt::Display for RawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Unscaled integer value of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawValue {
    Unsigned(u64),
    Signed(i64),
}

impl Default for RawValue {
    fn default() -> Self {
        RawValue::Unsigned(0)
    }
}

impl RawValue {
    /// Two's complement bit pattern of the value truncated to `bit_length` bits
    pub fn to_bits(self, bit_length: u16) -> u64 {
        let bits = match self {
            RawValue::Unsigned(v) => v,
            RawValue::Signed(v) => v as u64,
        };
        bits & length_mask(bit_length)
    }

    /// Interpret the low `bit_length` bits of `bits`, sign-extending for signed
    /// signals
    pub fn from_bits(bits: u64, bit_length: u16, signed: bool) -> Self {
        let bits = bits & length_mask(bit_length);
        if !signed {
            return RawValue::Unsigned(bits);
        }
        if bit_length >= 64 {
            return RawValue::Signed(bits as i64);
        }
        let shift = 64 - u32::from(bit_length);
        RawValue::Signed(((bits << shift) as i64) >> shift)
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            RawValue::Unsigned(v) => *v as f64,
            RawValue::Signed(v) => *v as f64,
        }
    }

    fn as_i128(&self) -> i128 {
        match self {
            RawValue::Unsigned(v) => i128::from(*v),
            RawValue::Signed(v) => i128::from(*v),
        }
    }
}

impl PartialOrd for RawValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RawValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_i128().cmp(&other.as_i128())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Unsigned(v) => write!(f, "{}", v),
            RawValue::Signed(v) => write!(f, "{}", v),
        }
    }
}

impl From<u64> for RawValue {
    fn from(value: u64) -> Self {
        RawValue::Unsigned(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Signed(value)
    }
}

/// Mask covering the low `bit_length` bits
pub(crate) fn length_mask(bit_length: u16) -> u64 {
    if bit_length >= 64 {
        u64::MAX
    } else {
        (1u64 << bit_length) - 1
    }
}
