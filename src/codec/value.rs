//! Field types and values for the message codec.
//!
//! The wire format tags every field with a 32-bit little-endian type word:
//!
//! ```text
//!  31      30..27      26..25   24         23..0
//! +-------+-----------+--------+----------+----------------------+
//! | array | base type | unused | shortlen | field id (24 bits)   |
//! +-------+-----------+--------+----------+----------------------+
//! ```
//!
//! Bit 24 doubles as the value bit for scalar booleans, which occupy no bytes
//! beyond the type word itself.

use super::message::Message;

/// Bit layout constants of the type word.
pub mod bits {
    /// Length (or boolean value) fits in one byte / is packed into the word.
    pub const SHORTLEN: u32 = 0x0100_0000;
    /// The field holds an array of its base type.
    pub const ARRAY: u32 = 0x8000_0000;
    /// Mask selecting the base-type bits (excluding the array bit).
    pub const BASE_FILTER: u32 = 0x7800_0000;
    /// Mask selecting the 24-bit field id.
    pub const NAME_FILTER: u32 = 0x00ff_ffff;
}

/// Base type of a field, before the optional "array of" wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// Single-byte-equivalent flag; scalars are packed into the type word.
    Bool,
    /// Unsigned 32-bit integer, short form when the value fits one byte.
    U32,
    /// Unsigned 64-bit integer, always full width.
    U64,
    /// 16-byte address.
    Addr6,
    /// Length-prefixed byte string.
    String,
    /// Nested message.
    Message,
    /// Length-prefixed opaque bytes.
    Raw,
}

impl BaseType {
    /// Wire bits of this base type within the type word.
    pub fn bits(self) -> u32 {
        match self {
            Self::Bool => 0x0000_0000,
            Self::U32 => 0x0800_0000,
            Self::U64 => 0x1000_0000,
            Self::Addr6 => 0x1800_0000,
            Self::String => 0x2000_0000,
            Self::Message => 0x2800_0000,
            Self::Raw => 0x3000_0000,
        }
    }

    /// Recover a base type from the type word's base bits.
    pub fn from_bits(word: u32) -> Option<Self> {
        match word & bits::BASE_FILTER {
            0x0000_0000 => Some(Self::Bool),
            0x0800_0000 => Some(Self::U32),
            0x1000_0000 => Some(Self::U64),
            0x1800_0000 => Some(Self::Addr6),
            0x2000_0000 => Some(Self::String),
            0x2800_0000 => Some(Self::Message),
            0x3000_0000 => Some(Self::Raw),
            _ => None,
        }
    }

    /// Fixed per-element wire size, or `None` for variable-width types.
    pub fn element_size(self) -> Option<usize> {
        match self {
            Self::Bool => Some(1),
            Self::U32 => Some(4),
            Self::U64 => Some(8),
            Self::Addr6 => Some(16),
            Self::String | Self::Message | Self::Raw => None,
        }
    }
}

/// Full field type: a base type plus the array flag.
///
/// Every (base, array) combination this struct can hold is legal on the wire;
/// illegal bit patterns are rejected at decode time by [`FieldType::from_word`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
    /// The base type.
    pub base: BaseType,
    /// Whether the field holds an array of the base type.
    pub array: bool,
}

impl FieldType {
    /// Scalar boolean.
    pub const BOOL: Self = Self::scalar(BaseType::Bool);
    /// Scalar u32.
    pub const U32: Self = Self::scalar(BaseType::U32);
    /// Scalar u64.
    pub const U64: Self = Self::scalar(BaseType::U64);
    /// Scalar 16-byte address.
    pub const ADDR6: Self = Self::scalar(BaseType::Addr6);
    /// Scalar byte string.
    pub const STRING: Self = Self::scalar(BaseType::String);
    /// Scalar nested message.
    pub const MESSAGE: Self = Self::scalar(BaseType::Message);
    /// Scalar opaque bytes.
    pub const RAW: Self = Self::scalar(BaseType::Raw);
    /// Array of booleans.
    pub const BOOL_ARRAY: Self = Self::array(BaseType::Bool);
    /// Array of u32.
    pub const U32_ARRAY: Self = Self::array(BaseType::U32);
    /// Array of u64.
    pub const U64_ARRAY: Self = Self::array(BaseType::U64);
    /// Array of 16-byte addresses.
    pub const ADDR6_ARRAY: Self = Self::array(BaseType::Addr6);
    /// Array of byte strings.
    pub const STRING_ARRAY: Self = Self::array(BaseType::String);
    /// Array of nested messages.
    pub const MESSAGE_ARRAY: Self = Self::array(BaseType::Message);
    /// Array of opaque byte values.
    pub const RAW_ARRAY: Self = Self::array(BaseType::Raw);

    /// Scalar field type.
    pub const fn scalar(base: BaseType) -> Self {
        Self { base, array: false }
    }

    /// Array field type.
    pub const fn array(base: BaseType) -> Self {
        Self { base, array: true }
    }

    /// Wire bits of this field type (base bits plus the array bit).
    pub fn type_bits(self) -> u32 {
        self.base.bits() | if self.array { bits::ARRAY } else { 0 }
    }

    /// Extract the field type from a full type word.
    ///
    /// Returns `None` for base-bit patterns outside the closed type set.
    pub fn from_word(word: u32) -> Option<Self> {
        Some(Self {
            base: BaseType::from_bits(word)?,
            array: word & bits::ARRAY != 0,
        })
    }
}

/// The value of a single field.
///
/// Strings are byte strings, not UTF-8; the wire carries them verbatim.
/// Nested messages make this type recursive.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Scalar boolean, packed into the type word.
    Bool(bool),
    /// Scalar u32.
    U32(u32),
    /// Scalar u64.
    U64(u64),
    /// Scalar 16-byte address.
    Addr6([u8; 16]),
    /// Scalar byte string.
    String(Vec<u8>),
    /// Scalar nested message.
    Message(Message),
    /// Scalar opaque bytes.
    Raw(Vec<u8>),
    /// Array of booleans.
    BoolArray(Vec<bool>),
    /// Array of u32.
    U32Array(Vec<u32>),
    /// Array of u64.
    U64Array(Vec<u64>),
    /// Array of 16-byte addresses.
    Addr6Array(Vec<[u8; 16]>),
    /// Array of byte strings.
    StringArray(Vec<Vec<u8>>),
    /// Array of nested messages.
    MessageArray(Vec<Message>),
    /// Array of opaque byte values.
    RawArray(Vec<Vec<u8>>),
}

impl Value {
    /// The field type this value encodes as.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::BOOL,
            Self::U32(_) => FieldType::U32,
            Self::U64(_) => FieldType::U64,
            Self::Addr6(_) => FieldType::ADDR6,
            Self::String(_) => FieldType::STRING,
            Self::Message(_) => FieldType::MESSAGE,
            Self::Raw(_) => FieldType::RAW,
            Self::BoolArray(_) => FieldType::BOOL_ARRAY,
            Self::U32Array(_) => FieldType::U32_ARRAY,
            Self::U64Array(_) => FieldType::U64_ARRAY,
            Self::Addr6Array(_) => FieldType::ADDR6_ARRAY,
            Self::StringArray(_) => FieldType::STRING_ARRAY,
            Self::MessageArray(_) => FieldType::MESSAGE_ARRAY,
            Self::RawArray(_) => FieldType::RAW_ARRAY,
        }
    }
}
