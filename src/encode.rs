//! The ABIv2 encoder.
//!
//! Encoding is the two-region head/tail layout: static values occupy
//! 32-byte-aligned words in the head, dynamic values contribute an offset
//! word to the head and append their payload to the tail. Offsets are
//! relative to the start of the enclosing tuple or array region.

use crate::{Error, Result, TupleElem, Type, Value};
use alloy_primitives::{I256, U256};

const WORD: usize = 32;

/// ABI-encodes `value` against `ty`.
///
/// For a tuple type this produces the parameter encoding of the tuple's
/// elements (the form used for call data and return data); other types are
/// encoded directly.
///
/// ```
/// use contract_abi::{encode, Type, Value, U256};
///
/// let ty: Type = "tuple(uint256)".parse()?;
/// let data = encode(&ty, &Value::tuple([Value::Uint(U256::from(42u64))]))?;
/// assert_eq!(data.len(), 32);
/// assert_eq!(data[31], 0x2a);
/// # Ok::<(), contract_abi::Error>(())
/// ```
pub fn encode(ty: &Type, value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(ty.head_size());
    encode_into(ty, value, &mut out)?;
    Ok(out)
}

fn encode_into(ty: &Type, value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match ty {
        Type::Tuple(elems) => encode_tuple(ty, elems, value, out),
        Type::Slice(elem) => {
            let values = seq_values(ty, value, None)?;
            append_len(values.len(), out);
            encode_seq(elem, values, out)
        }
        Type::Array(elem, size) => {
            let values = seq_values(ty, value, Some(*size))?;
            encode_seq(elem, values, out)
        }
        Type::String => {
            let Value::String(s) = value else { return Err(mismatch(ty, value)) };
            append_packed(s.as_bytes(), out);
            Ok(())
        }
        Type::Bytes => {
            let Value::Bytes(bytes) = value else { return Err(mismatch(ty, value)) };
            append_packed(bytes, out);
            Ok(())
        }
        _ => encode_word(ty, value, out),
    }
}

/// Heads in declaration order, then tails, with offsets counted from the
/// start of this region.
fn encode_tuple(ty: &Type, elems: &[TupleElem], value: &Value, out: &mut Vec<u8>) -> Result<()> {
    let Value::Tuple(fields) = value else { return Err(mismatch(ty, value)) };
    if fields.len() != elems.len() {
        return Err(Error::LengthMismatch {
            ty: ty.canonical(),
            expected: elems.len(),
            actual: fields.len(),
        });
    }

    let start = out.len();
    let mut tail_offset: usize = elems.iter().map(|e| head_width(&e.ty)).sum();
    let mut tails: Vec<Vec<u8>> = Vec::new();

    for (index, elem) in elems.iter().enumerate() {
        let field = tuple_field(fields, elem, index)
            .ok_or_else(|| missing_field(elem, index))?;
        if elem.ty.is_dynamic() {
            append_len(tail_offset, out);
            let tail = encode(&elem.ty, field).map_err(|e| e.with_path(path(elem, index)))?;
            tail_offset += tail.len();
            tails.push(tail);
        } else {
            encode_into(&elem.ty, field, out).map_err(|e| e.with_path(path(elem, index)))?;
        }
    }

    debug_assert_eq!(out.len() - start, elems.iter().map(|e| head_width(&e.ty)).sum::<usize>());
    for tail in tails {
        out.extend_from_slice(&tail);
    }
    Ok(())
}

/// Array and slice bodies: a uniform sequence of `elem`-typed values with
/// the same head/tail discipline as a tuple region.
fn encode_seq(elem: &Type, values: &[Value], out: &mut Vec<u8>) -> Result<()> {
    let mut tail_offset = head_width(elem) * values.len();
    let mut tails: Vec<Vec<u8>> = Vec::new();

    for (index, value) in values.iter().enumerate() {
        if elem.is_dynamic() {
            append_len(tail_offset, out);
            let tail = encode(elem, value).map_err(|e| e.with_path(format!("[{index}]")))?;
            tail_offset += tail.len();
            tails.push(tail);
        } else {
            encode_into(elem, value, out).map_err(|e| e.with_path(format!("[{index}]")))?;
        }
    }

    for tail in tails {
        out.extend_from_slice(&tail);
    }
    Ok(())
}

/// A single 32-byte head word for the atomic types.
fn encode_word(ty: &Type, value: &Value, out: &mut Vec<u8>) -> Result<()> {
    ty.check_width()?;
    let mut word = [0u8; WORD];
    match (ty, value) {
        (Type::Bool, Value::Bool(b)) => word[31] = *b as u8,
        (Type::Uint(bits), Value::Uint(v)) => {
            if v.bit_len() > *bits {
                return Err(Error::Range { ty: ty.canonical(), value: v.to_string() });
            }
            word = v.to_be_bytes::<WORD>();
        }
        (Type::Int(bits), Value::Int(v)) => {
            // The value fits `bits` iff the bits above the sign bit are all
            // equal to it: an arithmetic shift by `bits - 1` leaves 0 or -1.
            let sign = *v >> (bits - 1);
            if sign != I256::ZERO && sign != I256::MINUS_ONE {
                return Err(Error::Range { ty: ty.canonical(), value: v.to_string() });
            }
            word = v.to_be_bytes::<WORD>();
        }
        (Type::Address, Value::Address(addr)) => word[12..].copy_from_slice(addr.as_slice()),
        (Type::FixedBytes(len), Value::FixedBytes(bytes, actual)) => {
            if actual != len {
                return Err(Error::LengthMismatch {
                    ty: ty.canonical(),
                    expected: *len,
                    actual: *actual,
                });
            }
            word[..*len].copy_from_slice(&bytes[..*len]);
        }
        (Type::FixedBytes(len), Value::Bytes(bytes)) => {
            if bytes.len() != *len {
                return Err(Error::LengthMismatch {
                    ty: ty.canonical(),
                    expected: *len,
                    actual: bytes.len(),
                });
            }
            word[..*len].copy_from_slice(bytes);
        }
        (Type::Function, Value::Function(func)) => word[..24].copy_from_slice(func.as_slice()),
        _ => return Err(mismatch(ty, value)),
    }
    out.extend_from_slice(&word);
    Ok(())
}

/// Bytes the type contributes to the head region of its parent.
fn head_width(ty: &Type) -> usize {
    if ty.is_dynamic() {
        WORD
    } else {
        ty.head_size()
    }
}

fn seq_values<'v>(ty: &Type, value: &'v Value, size: Option<usize>) -> Result<&'v [Value]> {
    let values = match value {
        Value::Array(values) | Value::FixedArray(values) => values.as_slice(),
        _ => return Err(mismatch(ty, value)),
    };
    if let Some(size) = size {
        if values.len() != size {
            return Err(Error::LengthMismatch {
                ty: ty.canonical(),
                expected: size,
                actual: values.len(),
            });
        }
    }
    Ok(values)
}

/// Looks a tuple element up by name, falling back to the decimal position
/// for unnamed elements and positionally-built values.
fn tuple_field<'v>(
    fields: &'v std::collections::BTreeMap<String, Value>,
    elem: &TupleElem,
    index: usize,
) -> Option<&'v Value> {
    if !elem.name.is_empty() {
        if let Some(value) = fields.get(&elem.name) {
            return Some(value);
        }
    }
    fields.get(&index.to_string())
}

fn missing_field(elem: &TupleElem, index: usize) -> Error {
    Error::TypeMismatch { expected: elem.ty.canonical(), actual: "missing tuple field" }
        .with_path(path(elem, index))
}

fn path(elem: &TupleElem, index: usize) -> String {
    if elem.name.is_empty() {
        index.to_string()
    } else {
        elem.name.clone()
    }
}

fn mismatch(ty: &Type, value: &Value) -> Error {
    Error::TypeMismatch { expected: ty.canonical(), actual: value.kind_name() }
}

fn append_len(len: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&U256::from(len).to_be_bytes::<WORD>());
}

/// Length prefix followed by the payload, zero-padded to the next word.
fn append_packed(bytes: &[u8], out: &mut Vec<u8>) {
    append_len(bytes.len(), out);
    out.extend_from_slice(bytes);
    let rem = bytes.len() % WORD;
    if rem != 0 {
        out.resize(out.len() + WORD - rem, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{hex, Address};

    fn ty(s: &str) -> Type {
        s.parse().unwrap()
    }

    #[test]
    fn encode_uint_word() {
        let data = encode(&ty("tuple(uint256)"), &Value::tuple([Value::from(42u64)])).unwrap();
        let expected = hex!("000000000000000000000000000000000000000000000000000000000000002a");
        assert_eq!(data, expected);
    }

    #[test]
    fn encode_string_dave() {
        let data = encode(&ty("tuple(string)"), &Value::tuple([Value::from("dave")])).unwrap();
        let expected = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020
            0000000000000000000000000000000000000000000000000000000000000004
            6461766500000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(data, expected);
    }

    #[test]
    fn encode_uint_slice() {
        let value = Value::tuple([Value::Array(vec![
            Value::from(1u64),
            Value::from(2u64),
            Value::from(3u64),
        ])]);
        let data = encode(&ty("tuple(uint256[])"), &value).unwrap();
        let expected = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020
            0000000000000000000000000000000000000000000000000000000000000003
            0000000000000000000000000000000000000000000000000000000000000001
            0000000000000000000000000000000000000000000000000000000000000002
            0000000000000000000000000000000000000000000000000000000000000003"
        );
        assert_eq!(data, expected);
    }

    #[test]
    fn encode_static_tuple_of_addresses() {
        let value = Value::tuple([
            Value::Address(Address::from([0x11u8; 20])),
            Value::Address(Address::from([0x22u8; 20])),
        ]);
        let data = encode(&ty("tuple(address,address)"), &value).unwrap();
        let expected = hex!(
            "0000000000000000000000001111111111111111111111111111111111111111
            0000000000000000000000002222222222222222222222222222222222222222"
        );
        assert_eq!(data, expected);
    }

    #[test]
    fn encode_mixed_static_dynamic() {
        // (bool, string, uint8): one offset head between two static heads.
        let value = Value::tuple([
            Value::Bool(true),
            Value::from("gavofyork"),
            Value::from(2u8),
        ]);
        let data = encode(&ty("tuple(bool,string,uint8)"), &value).unwrap();
        let expected = hex!(
            "0000000000000000000000000000000000000000000000000000000000000001
            0000000000000000000000000000000000000000000000000000000000000060
            0000000000000000000000000000000000000000000000000000000000000002
            0000000000000000000000000000000000000000000000000000000000000009
            6761766f66796f726b0000000000000000000000000000000000000000000000"
        );
        assert_eq!(data, expected);
    }

    #[test]
    fn encode_nested_dynamic_arrays() {
        let value = Value::tuple([Value::Array(vec![
            Value::Array(vec![Value::Address(Address::from([0x11u8; 20]))]),
            Value::Array(vec![Value::Address(Address::from([0x22u8; 20]))]),
        ])]);
        let data = encode(&ty("tuple(address[][])"), &value).unwrap();
        let expected = hex!(
            "0000000000000000000000000000000000000000000000000000000000000020
            0000000000000000000000000000000000000000000000000000000000000002
            0000000000000000000000000000000000000000000000000000000000000040
            0000000000000000000000000000000000000000000000000000000000000080
            0000000000000000000000000000000000000000000000000000000000000001
            0000000000000000000000001111111111111111111111111111111111111111
            0000000000000000000000000000000000000000000000000000000000000001
            0000000000000000000000002222222222222222222222222222222222222222"
        );
        assert_eq!(data, expected);
    }

    #[test]
    fn encode_fixed_bytes_padding() {
        let data = encode(
            &ty("tuple(bytes2)"),
            &Value::tuple([Value::Bytes(vec![0x12, 0x34])]),
        )
        .unwrap();
        let expected = hex!("1234000000000000000000000000000000000000000000000000000000000000");
        assert_eq!(data, expected);
    }

    #[test]
    fn encode_negative_int() {
        let data = encode(&ty("tuple(int8)"), &Value::tuple([Value::from(-1i8)])).unwrap();
        let expected = hex!("ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
        assert_eq!(data, expected);
    }

    #[test]
    fn uint_range_checked() {
        let err = encode(&ty("tuple(uint8)"), &Value::tuple([Value::from(256u64)]));
        assert!(matches!(err, Err(Error::Path { source, .. }) if matches!(*source, Error::Range { .. })));
    }

    #[test]
    fn int_range_checked() {
        let ok = encode(&ty("tuple(int8)"), &Value::tuple([Value::from(-128i16)]));
        assert!(ok.is_ok());
        let err = encode(&ty("tuple(int8)"), &Value::tuple([Value::from(-129i16)]));
        assert!(matches!(err, Err(Error::Path { source, .. }) if matches!(*source, Error::Range { .. })));
        let err = encode(&ty("tuple(int8)"), &Value::tuple([Value::from(128i16)]));
        assert!(matches!(err, Err(Error::Path { source, .. }) if matches!(*source, Error::Range { .. })));
    }

    #[test]
    fn out_of_range_widths_rejected() {
        // Directly-built trees bypass the parser; the codec still has to
        // refuse them rather than panic.
        let err = encode(&Type::Int(0), &Value::from(-1i8)).unwrap_err();
        assert!(matches!(err, Error::TypeGrammar { .. }), "got {err:?}");
        let err = encode(&Type::Uint(12), &Value::from(1u8)).unwrap_err();
        assert!(matches!(err, Error::TypeGrammar { .. }), "got {err:?}");
        let err = encode(
            &Type::FixedBytes(33),
            &Value::FixedBytes(alloy_primitives::B256::ZERO, 33),
        )
        .unwrap_err();
        assert!(matches!(err, Error::TypeGrammar { .. }), "got {err:?}");
    }

    #[test]
    fn tuple_cardinality_checked() {
        let err = encode(&ty("tuple(uint256,uint256)"), &Value::tuple([Value::from(1u64)]));
        assert!(matches!(err, Err(Error::LengthMismatch { expected: 2, actual: 1, .. })));
    }

    #[test]
    fn named_lookup_with_positional_fallback() {
        let declared = ty("tuple(uint256 amount,address to)");
        let named = Value::Tuple(
            [
                ("amount".to_string(), Value::from(7u64)),
                ("to".to_string(), Value::Address(Address::ZERO)),
            ]
            .into_iter()
            .collect(),
        );
        let positional =
            Value::tuple([Value::from(7u64), Value::Address(Address::ZERO)]);
        assert_eq!(encode(&declared, &named).unwrap(), encode(&declared, &positional).unwrap());
    }
}
