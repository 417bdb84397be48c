//! Dynamic Solidity contract ABI support.
//!
//! This crate implements the Solidity ABIv2 calling convention without any
//! compile-time knowledge of the contract: types are parsed at runtime from
//! type-signature strings or from the JSON ABI descriptor, and values are
//! encoded and decoded against the resulting [`Type`] tree.
//!
//! The decoder is written for adversarial inputs: every read goes through an
//! explicit bounds check, dynamic offsets and length prefixes are rejected
//! when they fall outside the payload or exceed the signed 64-bit range, and
//! malformed words (non-canonical booleans, nonzero function padding) surface
//! as structured [`Error`]s rather than panics.
//!
//! # Examples
//!
//! ```
//! use contract_abi::{decode, encode, Type, Value, U256};
//!
//! let ty: Type = "tuple(uint256,string)".parse()?;
//! let value = Value::tuple([Value::Uint(U256::from(7u64)), Value::from("dave")]);
//!
//! let data = encode(&ty, &value)?;
//! assert_eq!(decode(&ty, &data)?, value);
//! # Ok::<(), contract_abi::Error>(())
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs, rust_2018_idioms)]

mod abi;
pub use abi::{Abi, Method};

mod decode;
pub use decode::decode;

mod encode;
pub use encode::encode;

mod error;
pub use error::{Error, Result};

mod event;
pub use event::Event;

pub mod hash;
pub use hash::keccak256;

mod parse;

mod ty;
pub use ty::{Type, TupleElem};

mod value;
pub use value::Value;

pub use alloy_primitives::{hex, Address, Bytes, Function, LogData, Selector, B256, I256, U256};
