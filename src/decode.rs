//! The ABIv2 decoder.
//!
//! The decoder mirrors the encoder's head/tail layout with strict bounds
//! checking: every read goes through [`read_slice`], dynamic offsets and
//! length prefixes are rejected when they exceed their region or the signed
//! 64-bit range, and malformed words surface as structured errors. Errors
//! carry the absolute byte offset of the failure and the path of the
//! element inside the type tree.

use crate::{Error, Result, TupleElem, Type, Value};
use alloy_primitives::{Address, Function, B256, I256, U256};
use std::collections::BTreeMap;

const WORD: usize = 32;

/// ABI-decodes `data` against `ty`.
///
/// ```
/// use contract_abi::{decode, Type, Value, U256};
/// use contract_abi::hex;
///
/// let ty: Type = "tuple(uint256)".parse()?;
/// let data = hex::decode("000000000000000000000000000000000000000000000000000000000000002a")?;
/// let value = decode(&ty, &data)?;
/// assert_eq!(value.as_tuple().unwrap()["0"], Value::Uint(U256::from(42u64)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn decode(ty: &Type, data: &[u8]) -> Result<Value> {
    decode_inner(ty, data, 0).map(|(value, _)| value)
}

/// Decodes one value from the front of `input`, returning the value and the
/// residual bytes of the region: everything past the consumed head words,
/// and for length-prefixed types past the zero-padded payload. `base` is
/// the absolute offset of `input` within the original payload, used for
/// error context.
pub(crate) fn decode_inner<'a>(
    ty: &Type,
    input: &'a [u8],
    base: usize,
) -> Result<(Value, &'a [u8])> {
    match ty {
        Type::Tuple(elems) => {
            let (fields, rest) = decode_tuple(elems, input, base)?;
            Ok((Value::Tuple(fields), rest))
        }
        Type::Slice(elem) => {
            let len = read_length(input, base)?;
            let body = read_slice(input, WORD as isize, 0, base)?;
            let (values, rest) = decode_seq(elem, body, base + WORD, len)?;
            Ok((Value::Array(values), rest))
        }
        Type::Array(elem, size) => {
            let (values, rest) = decode_seq(elem, input, base, *size)?;
            Ok((Value::FixedArray(values), rest))
        }
        Type::String => {
            let len = read_length(input, base)?;
            let payload = read_slice(input, WORD as isize, len as isize, base)?;
            let value = Value::String(String::from_utf8_lossy(payload).into_owned());
            Ok((value, read_slice(input, packed_end(input, len), 0, base)?))
        }
        Type::Bytes => {
            let len = read_length(input, base)?;
            let payload = read_slice(input, WORD as isize, len as isize, base)?;
            let value = Value::Bytes(payload.to_vec());
            Ok((value, read_slice(input, packed_end(input, len), 0, base)?))
        }
        _ => {
            let word = read_slice(input, 0, WORD as isize, base)?;
            let value = decode_word(ty, word, base)?;
            Ok((value, read_slice(input, WORD as isize, 0, base)?))
        }
    }
}

/// Tuple region: static elements consume their head in place, dynamic
/// elements re-enter the region at the offset their head points to.
fn decode_tuple<'a>(
    elems: &[TupleElem],
    input: &'a [u8],
    base: usize,
) -> Result<(BTreeMap<String, Value>, &'a [u8])> {
    let origin = input;
    let mut data = input;
    let mut fields = BTreeMap::new();

    for (index, elem) in elems.iter().enumerate() {
        let consumed = input.len() - data.len();
        let name =
            if elem.name.is_empty() { index.to_string() } else { elem.name.clone() };

        let value = if elem.ty.is_dynamic() {
            let offset = read_offset(data, origin.len(), base + consumed)?;
            let entry = &origin[offset..];
            let (value, _) = decode_inner(&elem.ty, entry, base + offset)
                .map_err(|e| e.with_path(name.clone()))?;
            data = read_slice(data, WORD as isize, 0, base + consumed)?;
            value
        } else {
            let (value, rest) = decode_inner(&elem.ty, data, base + consumed)
                .map_err(|e| e.with_path(name.clone()))?;
            data = rest;
            value
        };

        if fields.insert(name.clone(), value).is_some() {
            return Err(Error::TupleDup(name));
        }
    }
    Ok((fields, data))
}

/// Array and slice bodies: `size` elements over the region starting at the
/// array's first head word.
fn decode_seq<'a>(
    elem: &Type,
    input: &'a [u8],
    base: usize,
    size: usize,
) -> Result<(Vec<Value>, &'a [u8])> {
    // Every element owes at least one word of head.
    if size > input.len() / WORD {
        return Err(Error::Truncated {
            offset: base,
            expected: size.saturating_mul(WORD),
            available: input.len(),
        });
    }

    let origin = input;
    let mut data = input;
    let mut values = Vec::with_capacity(size);

    for index in 0..size {
        let consumed = input.len() - data.len();
        let value = if elem.is_dynamic() {
            let offset = read_offset(data, origin.len(), base + consumed)?;
            let entry = &origin[offset..];
            let (value, _) = decode_inner(elem, entry, base + offset)
                .map_err(|e| e.with_path(format!("[{index}]")))?;
            data = read_slice(data, WORD as isize, 0, base + consumed)?;
            value
        } else {
            let (value, rest) = decode_inner(elem, data, base + consumed)
                .map_err(|e| e.with_path(format!("[{index}]")))?;
            data = rest;
            value
        };
        values.push(value);
    }
    Ok((values, data))
}

/// Decodes one 32-byte head word of an atomic type.
fn decode_word(ty: &Type, word: &[u8], base: usize) -> Result<Value> {
    debug_assert_eq!(word.len(), WORD);
    ty.check_width()?;
    match ty {
        Type::Bool => match word[31] {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            byte => Err(Error::Bool { at: base + 31, byte }),
        },
        Type::Uint(_) => Ok(Value::Uint(U256::from_be_slice(word))),
        Type::Int(_) => {
            let mut bytes = [0u8; WORD];
            bytes.copy_from_slice(word);
            Ok(Value::Int(I256::from_be_bytes(bytes)))
        }
        Type::Address => Ok(Value::Address(Address::from_slice(&word[12..]))),
        Type::FixedBytes(len) => {
            let mut bytes = B256::ZERO;
            bytes[..*len].copy_from_slice(&word[..*len]);
            Ok(Value::FixedBytes(bytes, *len))
        }
        Type::Function => {
            if word[24..].iter().any(|&byte| byte != 0) {
                return Err(Error::Function { at: base });
            }
            let mut bytes = [0u8; 24];
            bytes.copy_from_slice(&word[..24]);
            Ok(Value::Function(Function::new(bytes)))
        }
        _ => unreachable!("decode_word is only called for atomic types"),
    }
}

/// Bytes consumed by a length-prefixed payload: the length word plus the
/// payload rounded up to the next word boundary, clamped to the input when
/// the final padding is absent.
fn packed_end(input: &[u8], len: usize) -> isize {
    (WORD + len.div_ceil(WORD) * WORD).min(input.len()) as isize
}

/// The single bounds gate every read goes through. `len == 0` means "to the
/// end of the input"; negative `start` or `len` index from the end, as in
/// the tail-trimming reads. Any violation is [`Error::Truncated`].
pub(crate) fn read_slice<'a>(
    input: &'a [u8],
    start: isize,
    len: isize,
    base: usize,
) -> Result<&'a [u8]> {
    let total = input.len();
    let start = if start < 0 { total as isize + start } else { start };
    let end = if len < 0 {
        total as isize + len
    } else if len > 0 {
        start.saturating_add(len)
    } else {
        total as isize
    };

    let truncated = Error::Truncated {
        offset: base + start.max(0) as usize,
        expected: end.max(0) as usize,
        available: total,
    };
    if start < 0 || end < start || end as usize > total {
        return Err(truncated);
    }
    Ok(&input[start as usize..end as usize])
}

/// Reads a 32-byte big-endian offset and validates it against the region:
/// it must fit the signed 64-bit range and fall within `region` bytes.
fn read_offset(data: &[u8], region: usize, base: usize) -> Result<usize> {
    let word = read_slice(data, 0, WORD as isize, base)?;
    let offset = U256::from_be_slice(word);
    if offset.bit_len() > 63 {
        return Err(Error::Offset { at: base, offset, region });
    }
    let offset_usize = offset.as_limbs()[0] as usize;
    if offset_usize > region {
        return Err(Error::Offset { at: base, offset, region });
    }
    Ok(offset_usize)
}

/// Reads a 32-byte big-endian length prefix, subject to the same 64-bit
/// bound as offsets and to the size of the remaining input.
fn read_length(data: &[u8], base: usize) -> Result<usize> {
    let word = read_slice(data, 0, WORD as isize, base)?;
    let length = U256::from_be_slice(word);
    if length.bit_len() > 63 {
        return Err(Error::Offset { at: base, offset: length, region: data.len() });
    }
    let length_usize = length.as_limbs()[0] as usize;
    if length_usize > data.len() {
        return Err(Error::Truncated {
            offset: base,
            expected: length_usize,
            available: data.len(),
        });
    }
    Ok(length_usize)
}
