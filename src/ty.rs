//! The Solidity type tree.

use crate::{Error, Result};
use core::fmt;
use core::str::FromStr;

/// A Solidity ABI type.
///
/// Parsed from a type-signature string or built from a JSON descriptor
/// entry, and consumed by the codec. The tree is a finite, owned value:
/// cloning is deep and equality is structural.
///
/// The parser only produces trees whose integer and fixed-bytes widths are
/// in range; for directly-constructed trees the codec validates widths at
/// its word boundaries and reports [`Error::TypeGrammar`] rather than
/// panicking.
///
/// ```
/// use contract_abi::Type;
///
/// let ty: Type = "tuple(uint256,address)[]".parse()?;
/// assert!(ty.is_dynamic());
/// assert_eq!(ty.to_string(), "tuple(uint256,address)[]");
/// # Ok::<(), contract_abi::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    /// `bool`.
    Bool,
    /// `intN`, with the bit width (a multiple of 8 in `[8, 256]`).
    Int(usize),
    /// `uintN`, with the bit width (a multiple of 8 in `[8, 256]`).
    Uint(usize),
    /// `address`.
    Address,
    /// `string`.
    String,
    /// `bytes`.
    Bytes,
    /// `bytesN`, with the byte length in `[1, 32]`.
    FixedBytes(usize),
    /// `function`: an address followed by a selector, 24 bytes.
    Function,
    /// `T[N]`: a fixed-size array.
    Array(Box<Type>, usize),
    /// `T[]`: a dynamically-sized array.
    Slice(Box<Type>),
    /// `tuple(...)`, with ordered, optionally named elements.
    Tuple(Vec<TupleElem>),
}

/// One element of a [`Type::Tuple`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TupleElem {
    /// Element name; may be empty.
    pub name: String,
    /// Element type.
    pub ty: Type,
    /// Whether the element is promoted to a topic in event logs.
    pub indexed: bool,
}

impl TupleElem {
    /// Creates an unnamed, non-indexed element.
    pub fn unnamed(ty: Type) -> Self {
        Self { name: String::new(), ty, indexed: false }
    }

    /// Creates a named, non-indexed element.
    pub fn named(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty, indexed: false }
    }
}

impl Type {
    /// Returns true if the encoding of this type has no fixed size, i.e. the
    /// type is encoded in the tail region behind an offset word.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::String | Self::Bytes | Self::Slice(_) => true,
            Self::Array(elem, _) => elem.is_dynamic(),
            Self::Tuple(elems) => elems.iter().any(|e| e.ty.is_dynamic()),
            _ => false,
        }
    }

    /// Returns true if the encoding carries a 32-byte length prefix.
    pub fn has_length_prefix(&self) -> bool {
        matches!(self, Self::String | Self::Bytes | Self::Slice(_))
    }

    /// Returns true for types whose value fits a single 32-byte word.
    /// Everything else is a reference type, which event logs index by
    /// digest rather than by value.
    pub(crate) fn is_value_type(&self) -> bool {
        matches!(
            self,
            Self::Bool
                | Self::Int(_)
                | Self::Uint(_)
                | Self::Address
                | Self::FixedBytes(_)
                | Self::Function
        )
    }

    /// The number of bytes the type occupies in the head region. Only
    /// meaningful for static types.
    pub(crate) fn head_size(&self) -> usize {
        match self {
            Self::Array(elem, size) => size * elem.head_size(),
            Self::Tuple(elems) => elems.iter().map(|e| e.ty.head_size()).sum(),
            _ => 32,
        }
    }

    /// Rejects out-of-range integer and fixed-bytes widths. Parsed trees
    /// always pass; this covers directly-constructed ones reaching the
    /// codec.
    pub(crate) fn check_width(&self) -> Result<()> {
        let reason = match self {
            Self::Int(bits) | Self::Uint(bits)
                if *bits == 0 || *bits > 256 || bits % 8 != 0 =>
            {
                "integer width must be a multiple of 8 within 8..=256"
            }
            Self::FixedBytes(len) if !(1..=32).contains(len) => {
                "fixed-bytes length must be within 1..=32"
            }
            _ => return Ok(()),
        };
        Err(Error::TypeGrammar { input: self.canonical(), position: 0, reason })
    }

    /// The elements of a tuple type, if this is one.
    pub fn as_tuple(&self) -> Option<&[TupleElem]> {
        match self {
            Self::Tuple(elems) => Some(elems),
            _ => None,
        }
    }

    /// Renders the canonical form of the type: no whitespace, integer
    /// widths spelled out, element names and `indexed` omitted.
    ///
    /// The canonical form re-parses to a structurally equal type and is the
    /// form that participates in signatures and selectors.
    pub fn canonical(&self) -> String {
        let mut out = String::with_capacity(16);
        self.fmt_canonical(&mut out);
        out
    }

    fn fmt_canonical(&self, out: &mut String) {
        match self {
            Self::Bool => out.push_str("bool"),
            Self::Int(bits) => {
                out.push_str("int");
                out.push_str(&bits.to_string());
            }
            Self::Uint(bits) => {
                out.push_str("uint");
                out.push_str(&bits.to_string());
            }
            Self::Address => out.push_str("address"),
            Self::String => out.push_str("string"),
            Self::Bytes => out.push_str("bytes"),
            Self::FixedBytes(len) => {
                out.push_str("bytes");
                out.push_str(&len.to_string());
            }
            Self::Function => out.push_str("function"),
            Self::Array(elem, size) => {
                elem.fmt_canonical(out);
                out.push('[');
                out.push_str(&size.to_string());
                out.push(']');
            }
            Self::Slice(elem) => {
                elem.fmt_canonical(out);
                out.push_str("[]");
            }
            Self::Tuple(elems) => {
                out.push_str("tuple(");
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    elem.ty.fmt_canonical(out);
                }
                out.push(')');
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for Type {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::parse::parse_type(s)
    }
}
