//! The polymorphic value type consumed and produced by the codec.

use alloy_primitives::{Address, Function, B256, I256, U256};
use std::collections::BTreeMap;

/// A Solidity value, tagged to mirror the [`Type`](crate::Type) tags.
///
/// Values are what the encoder consumes and the decoder produces. Tuple
/// values are keyed by element name, with the decimal element index used
/// for unnamed elements; [`Value::tuple`] builds the positional form, which
/// the encoder also accepts for named tuples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// An unsigned integer of any declared width, held as 256 bits.
    Uint(U256),
    /// A signed integer of any declared width, held as 256 bits.
    Int(I256),
    /// A 20-byte address.
    Address(Address),
    /// A fixed-length byte array, left-aligned in the word, with its length.
    FixedBytes(B256, usize),
    /// A function pointer: address followed by selector, 24 bytes.
    Function(Function),
    /// A dynamic byte string.
    Bytes(Vec<u8>),
    /// A string.
    String(String),
    /// A dynamically-sized array.
    Array(Vec<Value>),
    /// A fixed-size array.
    FixedArray(Vec<Value>),
    /// A tuple, keyed by element name or decimal element index.
    Tuple(BTreeMap<String, Value>),
}

impl Value {
    /// Builds a tuple value from positional elements, keyed `"0"`, `"1"`, …
    ///
    /// The encoder falls back to positional keys for named tuple elements,
    /// so this form encodes against any tuple type of matching arity.
    pub fn tuple(values: impl IntoIterator<Item = Value>) -> Self {
        Self::Tuple(
            values.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect(),
        )
    }

    /// The variant name, used in mismatch errors.
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Uint(_) => "uint",
            Self::Int(_) => "int",
            Self::Address(_) => "address",
            Self::FixedBytes(..) => "fixed bytes",
            Self::Function(_) => "function",
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::FixedArray(_) => "fixed array",
            Self::Tuple(_) => "tuple",
        }
    }

    /// Returns the boolean, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the unsigned integer, if this is a [`Value::Uint`].
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Self::Uint(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the signed integer, if this is a [`Value::Int`].
    pub fn as_int(&self) -> Option<I256> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the unsigned integer as a `u64`, if it fits.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint(value) if value.bit_len() <= 64 => Some(value.as_limbs()[0]),
            _ => None,
        }
    }

    /// Returns the address, if this is a [`Value::Address`].
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Self::Address(addr) => Some(*addr),
            _ => None,
        }
    }

    /// Returns the byte string, if this is a [`Value::Bytes`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the string, if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements, if this is an array of either kind.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Self::Array(values) | Self::FixedArray(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the fields, if this is a [`Value::Tuple`].
    pub fn as_tuple(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Tuple(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Address> for Value {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<Function> for Value {
    fn from(value: Function) -> Self {
        Self::Function(value)
    }
}

impl From<U256> for Value {
    fn from(value: U256) -> Self {
        Self::Uint(value)
    }
}

impl From<I256> for Value {
    fn from(value: I256) -> Self {
        Self::Int(value)
    }
}

impl From<B256> for Value {
    fn from(value: B256) -> Self {
        Self::FixedBytes(value, 32)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

macro_rules! impl_from_uint {
    ($($t:ty),+) => {$(
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Self::Uint(U256::from(value))
            }
        }
    )+};
}

impl_from_uint!(u8, u16, u32, u64, u128);

macro_rules! impl_from_int {
    ($($t:ty),+) => {$(
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                const BYTES: usize = (<$t>::BITS / 8) as usize;
                let mut word = if value.is_negative() { [0xffu8; 32] } else { [0u8; 32] };
                word[32 - BYTES..].copy_from_slice(&value.to_be_bytes());
                Self::Int(I256::from_be_bytes(word))
            }
        }
    )+};
}

impl_from_int!(i8, i16, i32, i64, i128);
