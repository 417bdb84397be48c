//! Event descriptors and log decoding.
//!
//! A log is up to four 32-byte topics plus a byte-string payload. For
//! non-anonymous events `topics[0]` carries the event id; each `indexed`
//! input consumes one of the remaining topics, and the non-indexed inputs
//! are ABI-decoded as a tuple over the payload. Indexed reference types
//! (strings, byte strings, arrays, tuples) are logged as their Keccak
//! digest, so they come back as opaque 32-byte values.

use crate::abi::{build_full_signature, build_signature, split_signature};
use crate::{decode, keccak256, Error, Result, TupleElem, Type, Value};
use alloy_primitives::{B256, LogData};
use core::fmt;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// A contract event.
#[derive(Clone, Debug)]
pub struct Event {
    /// The source name, without any overload suffix.
    pub name: String,
    /// True if the event is declared `anonymous`: its id is not logged and
    /// every topic belongs to an indexed input.
    pub anonymous: bool,
    /// Input parameters; always a [`Type::Tuple`], with the per-element
    /// `indexed` flag set for topic-promoted inputs.
    pub inputs: Type,
    id: OnceLock<B256>,
}

impl Event {
    /// Parses a human-readable signature such as
    /// `Transfer(address indexed from,address indexed to,uint256 value)`.
    pub fn new(signature: &str) -> Result<Self> {
        let (name, inputs) = split_signature(signature)?;
        Ok(Self::from_parts(name, false, inputs))
    }

    /// Creates an event from its already-parsed parts.
    pub fn from_parts(name: impl Into<String>, anonymous: bool, inputs: Type) -> Self {
        Self { name: name.into(), anonymous, inputs, id: OnceLock::new() }
    }

    /// The canonical signature: `name(type,…)` with no names or whitespace.
    pub fn signature(&self) -> String {
        build_signature(&self.name, &self.inputs)
    }

    /// A human-facing signature that keeps element names and `indexed`
    /// markers. Not used for id derivation.
    pub fn full_signature(&self) -> String {
        build_full_signature(&self.name, &self.inputs)
    }

    /// The 32-byte event id: `keccak256(signature)`, computed on first
    /// access and cached.
    pub fn id(&self) -> B256 {
        *self.id.get_or_init(|| keccak256(self.signature().as_bytes()))
    }

    /// Returns true iff the log's first topic carries this event's id.
    pub fn matches(&self, log: &LogData) -> bool {
        log.topics().first() == Some(&self.id())
    }

    /// Decodes a log against this event's inputs.
    ///
    /// Indexed elements are read from the topics (starting after the id
    /// topic, or from the first topic for anonymous events); value types
    /// decode to their value, reference types stay opaque 32-byte words.
    /// Non-indexed elements decode as a tuple over the log data. The two
    /// halves merge into one map keyed by element name or declaration
    /// index.
    pub fn parse_log(&self, log: &LogData) -> Result<BTreeMap<String, Value>> {
        if !self.anonymous && !self.matches(log) {
            return Err(Error::LogMismatch(self.name.clone()));
        }

        let elems = self.inputs.as_tuple().unwrap_or(&[]);
        let topics = log.topics();
        let mut next_topic = usize::from(!self.anonymous);

        // Non-indexed elements form their own tuple over `data`, keyed the
        // way the merged result will be keyed.
        let data_elems: Vec<TupleElem> = elems
            .iter()
            .enumerate()
            .filter(|(_, elem)| !elem.indexed)
            .map(|(index, elem)| TupleElem {
                name: result_key(elem, index),
                ty: elem.ty.clone(),
                indexed: false,
            })
            .collect();
        let decoded = decode(&Type::Tuple(data_elems), &log.data)?;
        let Value::Tuple(mut data_fields) = decoded else { unreachable!("tuple in, tuple out") };

        let mut fields = BTreeMap::new();
        for (index, elem) in elems.iter().enumerate() {
            let key = result_key(elem, index);
            let value = if elem.indexed {
                let topic = topics.get(next_topic).ok_or(Error::Truncated {
                    offset: next_topic * 32,
                    expected: (next_topic + 1) * 32,
                    available: topics.len() * 32,
                })?;
                next_topic += 1;
                decode_topic(&elem.ty, topic).map_err(|e| e.with_path(key.clone()))?
            } else {
                // Already decoded; the data tuple's own duplicate check ran.
                let Some(value) = data_fields.remove(&key) else {
                    return Err(Error::TupleDup(key));
                };
                value
            };
            if fields.insert(key.clone(), value).is_some() {
                return Err(Error::TupleDup(key));
            }
        }
        Ok(fields)
    }
}

/// A topic holds the value for single-word types and the Keccak digest for
/// reference types, which stays opaque.
fn decode_topic(ty: &Type, topic: &B256) -> Result<Value> {
    if ty.is_value_type() {
        decode(ty, topic.as_slice())
    } else {
        Ok(Value::FixedBytes(*topic, 32))
    }
}

fn result_key(elem: &TupleElem, index: usize) -> String {
    if elem.name.is_empty() {
        index.to_string()
    } else {
        elem.name.clone()
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        // The memoized id is derived state and does not participate.
        self.name == other.name
            && self.anonymous == other.anonymous
            && self.inputs == other.inputs
    }
}

impl Eq for Event {}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode, Address, U256};
    use alloy_primitives::hex;

    fn transfer() -> Event {
        Event::new("Transfer(address indexed from,address indexed to,uint256 value)").unwrap()
    }

    fn transfer_log(from: Address, to: Address, value: u64) -> LogData {
        let amount = encode(
            &"tuple(uint256)".parse().unwrap(),
            &Value::tuple([Value::Uint(U256::from(value))]),
        )
        .unwrap();
        LogData::new_unchecked(
            vec![transfer().id(), from.into_word(), to.into_word()],
            amount.into(),
        )
    }

    #[test]
    fn transfer_event_id() {
        assert_eq!(
            transfer().id(),
            B256::new(hex!(
                "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
            ))
        );
        assert_eq!(transfer().signature(), "Transfer(address,address,uint256)");
    }

    #[test]
    fn matches_by_first_topic() {
        let from = Address::from([1u8; 20]);
        let to = Address::from([2u8; 20]);
        let log = transfer_log(from, to, 10);
        assert!(transfer().matches(&log));

        let other = Event::new("Approval(address,address,uint256)").unwrap();
        assert!(!other.matches(&log));
        assert!(!transfer().matches(&LogData::new_unchecked(vec![], Default::default())));
    }

    #[test]
    fn parse_transfer_log() {
        let from = Address::from([1u8; 20]);
        let to = Address::from([2u8; 20]);
        let log = transfer_log(from, to, 1000);

        let fields = transfer().parse_log(&log).unwrap();
        assert_eq!(fields["from"], Value::Address(from));
        assert_eq!(fields["to"], Value::Address(to));
        assert_eq!(fields["value"], Value::Uint(U256::from(1000u64)));
    }

    #[test]
    fn mismatched_log_rejected() {
        let log = LogData::new_unchecked(vec![B256::ZERO], Default::default());
        let err = transfer().parse_log(&log).unwrap_err();
        assert_eq!(err, Error::LogMismatch("Transfer".to_string()));
    }

    #[test]
    fn missing_topic_rejected() {
        let from = Address::from([1u8; 20]);
        let log = LogData::new_unchecked(
            vec![transfer().id(), from.into_word()],
            encode(
                &"tuple(uint256)".parse().unwrap(),
                &Value::tuple([Value::from(1u64)]),
            )
            .unwrap()
            .into(),
        );
        let err = transfer().parse_log(&log).unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));
    }

    #[test]
    fn indexed_reference_type_stays_opaque() {
        let event = Event::new("Named(string indexed tag,uint256 value)").unwrap();
        let digest = keccak256(b"hello");
        let log = LogData::new_unchecked(
            vec![event.id(), digest],
            encode(
                &"tuple(uint256)".parse().unwrap(),
                &Value::tuple([Value::from(5u64)]),
            )
            .unwrap()
            .into(),
        );
        let fields = event.parse_log(&log).unwrap();
        assert_eq!(fields["tag"], Value::FixedBytes(digest, 32));
        assert_eq!(fields["value"], Value::Uint(U256::from(5u64)));
    }

    #[test]
    fn anonymous_event_uses_all_topics() {
        let mut event = Event::new("Ping(address indexed who,uint64 n)").unwrap();
        event.anonymous = true;
        let who = Address::from([7u8; 20]);
        let log = LogData::new_unchecked(
            vec![who.into_word()],
            encode(
                &"tuple(uint64)".parse().unwrap(),
                &Value::tuple([Value::from(3u64)]),
            )
            .unwrap()
            .into(),
        );
        let fields = event.parse_log(&log).unwrap();
        assert_eq!(fields["who"], Value::Address(who));
        assert_eq!(fields["n"], Value::Uint(U256::from(3u64)));
    }

    #[test]
    fn unnamed_inputs_keyed_by_declaration_index() {
        let event = Event::new("Moved(address indexed,uint256)").unwrap();
        let who = Address::from([9u8; 20]);
        let log = LogData::new_unchecked(
            vec![event.id(), who.into_word()],
            encode(
                &"tuple(uint256)".parse().unwrap(),
                &Value::tuple([Value::from(2u64)]),
            )
            .unwrap()
            .into(),
        );
        let fields = event.parse_log(&log).unwrap();
        assert_eq!(fields["0"], Value::Address(who));
        assert_eq!(fields["1"], Value::Uint(U256::from(2u64)));
    }
}
