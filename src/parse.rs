//! Parser for Solidity type-signature strings.
//!
//! Grammar:
//!
//! ```text
//! type   := atom suffix*
//! suffix := "[" digits? "]"
//! atom   := "uint" N? | "int" N? | "bool" | "address"
//!         | "string" | "bytes" N? | "function"
//!         | "tuple" "(" list? ")"
//! list   := field ("," field)*
//! field  := type (" " IDENT)? (" indexed")?
//! ```
//!
//! `uint`/`int` default to a width of 256 and `bytes` without a length is
//! the dynamic byte string. Element names and the `indexed` flag inside
//! tuples are kept as side data; they do not appear in the canonical form.

use crate::{Error, Result, TupleElem, Type};

/// Parses a complete type-signature string.
pub(crate) fn parse_type(input: &str) -> Result<Type> {
    let mut cursor = Cursor { input, bytes: input.as_bytes(), pos: 0 };
    let ty = cursor.parse_type()?;
    if cursor.pos != cursor.bytes.len() {
        return Err(cursor.err("trailing characters after type"));
    }
    Ok(ty)
}

/// Applies `[]` / `[N]` suffixes from `suffixes` to `base`. Used by the
/// JSON descriptor parser, where the array part of `tuple[2][]` arrives as
/// a string next to the `components` list.
pub(crate) fn parse_array_suffixes(base: Type, suffixes: &str) -> Result<Type> {
    let mut cursor = Cursor { input: suffixes, bytes: suffixes.as_bytes(), pos: 0 };
    let ty = cursor.parse_suffixes(base)?;
    if cursor.pos != cursor.bytes.len() {
        return Err(cursor.err("expected array suffix"));
    }
    Ok(ty)
}

struct Cursor<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn err(&self, reason: &'static str) -> Error {
        Error::TypeGrammar { input: self.input.to_string(), position: self.pos, reason }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    /// Reads a run of `[a-zA-Z0-9_$]`.
    fn ident(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$' {
                self.pos += 1;
            } else {
                break;
            }
        }
        &self.input[start..self.pos]
    }

    /// Reads a run of digits as a decimal number, or `None` if the cursor
    /// is not on a digit. Overflow is a grammar error.
    fn digits(&mut self) -> Result<Option<usize>> {
        let start = self.pos;
        while self.peek().is_some_and(|byte| byte.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Ok(None);
        }
        self.input[start..self.pos]
            .parse::<usize>()
            .map(Some)
            .map_err(|_| self.err("numeric suffix out of range"))
    }

    fn parse_type(&mut self) -> Result<Type> {
        let atom = self.parse_atom()?;
        self.parse_suffixes(atom)
    }

    fn parse_suffixes(&mut self, mut ty: Type) -> Result<Type> {
        while self.eat(b'[') {
            let size = self.digits()?;
            if !self.eat(b']') {
                return Err(self.err("unbalanced array brackets"));
            }
            ty = match size {
                Some(size) => Type::Array(Box::new(ty), size),
                None => Type::Slice(Box::new(ty)),
            };
        }
        Ok(ty)
    }

    fn parse_atom(&mut self) -> Result<Type> {
        let start = self.pos;
        let ident = self.ident();
        match ident {
            "bool" => Ok(Type::Bool),
            "address" => Ok(Type::Address),
            "string" => Ok(Type::String),
            "function" => Ok(Type::Function),
            "tuple" => self.parse_tuple(),
            "bytes" => Ok(Type::Bytes),
            "uint" => Ok(Type::Uint(256)),
            "int" => Ok(Type::Int(256)),
            _ => {
                if let Some(digits) = ident.strip_prefix("bytes") {
                    let len = parse_all_digits(digits)
                        .ok_or_else(|| self.err("invalid fixed-bytes length"))?;
                    if !(1..=32).contains(&len) {
                        return Err(self.err("fixed-bytes length must be within 1..=32"));
                    }
                    return Ok(Type::FixedBytes(len));
                }
                if let Some(digits) = ident.strip_prefix("uint") {
                    return Ok(Type::Uint(self.int_width(digits)?));
                }
                if let Some(digits) = ident.strip_prefix("int") {
                    return Ok(Type::Int(self.int_width(digits)?));
                }
                self.pos = start;
                Err(self.err("unknown type atom"))
            }
        }
    }

    fn int_width(&self, digits: &str) -> Result<usize> {
        let bits =
            parse_all_digits(digits).ok_or_else(|| self.err("invalid integer width"))?;
        if bits == 0 || bits > 256 || bits % 8 != 0 {
            return Err(self.err("integer width must be a multiple of 8 within 8..=256"));
        }
        Ok(bits)
    }

    fn parse_tuple(&mut self) -> Result<Type> {
        if !self.eat(b'(') {
            return Err(self.err("expected `(` after `tuple`"));
        }
        let mut elems = Vec::new();
        self.skip_spaces();
        if self.eat(b')') {
            return Ok(Type::Tuple(elems));
        }
        loop {
            elems.push(self.parse_field()?);
            self.skip_spaces();
            match self.bump() {
                Some(b',') => self.skip_spaces(),
                Some(b')') => break,
                _ => return Err(self.err("unbalanced tuple parentheses")),
            }
        }
        Ok(Type::Tuple(elems))
    }

    /// One tuple field: a type, optionally followed by a name and the
    /// `indexed` keyword in either order.
    fn parse_field(&mut self) -> Result<TupleElem> {
        let ty = self.parse_type()?;
        let mut elem = TupleElem::unnamed(ty);
        while self.peek() == Some(b' ') {
            self.skip_spaces();
            let start = self.pos;
            let word = self.ident();
            if word.is_empty() {
                self.pos = start;
                break;
            }
            if word == "indexed" {
                elem.indexed = true;
            } else {
                elem.name = word.to_string();
            }
        }
        Ok(elem)
    }
}

fn parse_all_digits(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
