//! The contract ABI document: methods, events, and the JSON descriptor
//! parser that builds them.

use crate::{decode, encode, keccak256, Error, Event, Result, TupleElem, Type, Value};
use alloy_primitives::Selector;
use core::fmt;
use core::str::FromStr;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{debug, trace};

/// A parsed contract ABI.
///
/// Built from the JSON descriptor emitted by the Solidity compiler.
/// Overloaded method and event names are disambiguated with the smallest
/// free decimal suffix (`send`, `send0`, `send1`, …); the renaming is
/// deterministic for a given descriptor.
///
/// The document is immutable after parsing, except for the lazily memoized
/// method selectors and event ids.
#[derive(Clone, Debug, Default)]
pub struct Abi {
    /// The constructor, if the descriptor declares one.
    pub constructor: Option<Method>,
    /// Methods by (possibly suffixed) name.
    pub methods: BTreeMap<String, Method>,
    /// Events by (possibly suffixed) name.
    pub events: BTreeMap<String, Event>,
}

impl Abi {
    /// Parses a JSON ABI descriptor.
    pub fn from_json(descriptor: &str) -> Result<Self> {
        let items: Vec<RawItem> =
            serde_json::from_str(descriptor).map_err(|e| Error::Json(e.to_string()))?;

        let mut abi = Self::default();
        for item in &items {
            match item.kind.as_str() {
                "constructor" => {
                    if abi.constructor.is_some() {
                        return Err(Error::Duplicate);
                    }
                    abi.constructor = Some(Method {
                        name: String::new(),
                        constant: false,
                        inputs: params_type(&item.inputs)?,
                        outputs: Type::Tuple(Vec::new()),
                        id: OnceLock::new(),
                    });
                }
                "function" | "" => {
                    let constant = item.constant
                        || matches!(item.state_mutability.as_deref(), Some("view" | "pure"));
                    let key = overloaded_name(&item.name, |name| abi.methods.contains_key(name));
                    if key != item.name {
                        debug!(from = %item.name, to = %key, "renamed overloaded method");
                    }
                    abi.methods.insert(
                        key,
                        Method {
                            name: item.name.clone(),
                            constant,
                            inputs: params_type(&item.inputs)?,
                            outputs: params_type(&item.outputs)?,
                            id: OnceLock::new(),
                        },
                    );
                }
                "event" => {
                    let key = overloaded_name(&item.name, |name| abi.events.contains_key(name));
                    if key != item.name {
                        debug!(from = %item.name, to = %key, "renamed overloaded event");
                    }
                    abi.events.insert(
                        key,
                        Event::from_parts(
                            item.name.clone(),
                            item.anonymous,
                            params_type(&item.inputs)?,
                        ),
                    );
                }
                // Error declarations and the fallback/receive entries carry
                // no call surface of their own.
                "error" | "fallback" | "receive" => {}
                other => return Err(Error::UnknownField(other.to_string())),
            }
        }
        trace!(
            methods = abi.methods.len(),
            events = abi.events.len(),
            constructor = abi.constructor.is_some(),
            "parsed contract ABI descriptor"
        );
        Ok(abi)
    }

    /// The method registered under `name` (after overload renaming).
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// The event registered under `name` (after overload renaming).
    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.get(name)
    }
}

impl FromStr for Abi {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

/// A callable function of the contract.
#[derive(Clone, Debug)]
pub struct Method {
    /// The source name, without any overload suffix.
    pub name: String,
    /// True for `view`/`pure` (or legacy `constant`) methods.
    pub constant: bool,
    /// Input parameters; always a [`Type::Tuple`].
    pub inputs: Type,
    /// Output parameters; always a [`Type::Tuple`].
    pub outputs: Type,
    id: OnceLock<Selector>,
}

impl Method {
    /// Creates a method from a name and its input/output tuples.
    pub fn new(name: impl Into<String>, inputs: Type, outputs: Type) -> Self {
        Self {
            name: name.into(),
            constant: false,
            inputs,
            outputs,
            id: OnceLock::new(),
        }
    }

    /// Parses a human-readable signature such as `transfer(address,uint256)`
    /// into a method with no outputs.
    pub fn parse_signature(signature: &str) -> Result<Self> {
        let (name, inputs) = split_signature(signature)?;
        Ok(Self::new(name, inputs, Type::Tuple(Vec::new())))
    }

    /// The canonical signature: `name(type,…)` with no names or whitespace.
    pub fn signature(&self) -> String {
        build_signature(&self.name, &self.inputs)
    }

    /// A human-facing signature that keeps element names and `indexed`
    /// markers. Not used for selector derivation.
    pub fn full_signature(&self) -> String {
        match self.outputs.as_tuple() {
            Some(outputs) if !outputs.is_empty() => format!(
                "{} returns {}",
                build_full_signature(&self.name, &self.inputs),
                build_full_signature("", &self.outputs)
            ),
            _ => build_full_signature(&self.name, &self.inputs),
        }
    }

    /// The 4-byte selector: `keccak256(signature)[..4]`, computed on first
    /// access and cached.
    pub fn id(&self) -> Selector {
        *self.id.get_or_init(|| {
            let digest = keccak256(self.signature().as_bytes());
            Selector::from_slice(&digest[..4])
        })
    }

    /// ABI-encodes `values` as call data for this method, prefixed with the
    /// selector.
    pub fn abi_encode_input(&self, values: &[Value]) -> Result<Vec<u8>> {
        let encoded = encode(&self.inputs, &Value::tuple(values.iter().cloned()))?;
        let mut data = Vec::with_capacity(4 + encoded.len());
        data.extend_from_slice(self.id().as_slice());
        data.extend_from_slice(&encoded);
        Ok(data)
    }

    /// ABI-decodes return data against this method's output tuple.
    pub fn abi_decode_output(&self, data: &[u8]) -> Result<Value> {
        decode(&self.outputs, data)
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        // The memoized selector is derived state and does not participate.
        self.name == other.name
            && self.constant == other.constant
            && self.inputs == other.inputs
            && self.outputs == other.outputs
    }
}

impl Eq for Method {}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

/// Splits `name(types)` into the name and a parsed input tuple.
pub(crate) fn split_signature(signature: &str) -> Result<(String, Type)> {
    let err = |reason| Error::TypeGrammar {
        input: signature.to_string(),
        position: 0,
        reason,
    };
    if !signature.ends_with(')') {
        return Err(err("expected `name(types)`"));
    }
    let open = signature.find('(').ok_or_else(|| err("expected `name(types)`"))?;
    let (name, params) = signature.split_at(open);
    let inputs: Type = format!("tuple{params}").parse()?;
    Ok((name.to_string(), inputs))
}

/// `name(raw1,raw2,…)` over the canonical element renderings.
pub(crate) fn build_signature(name: &str, inputs: &Type) -> String {
    let mut out = String::with_capacity(name.len() + 16);
    out.push_str(name);
    out.push('(');
    if let Some(elems) = inputs.as_tuple() {
        for (i, elem) in elems.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&elem.ty.canonical());
        }
    }
    out.push(')');
    out
}

/// Like [`build_signature`], annotated with `indexed` and element names.
pub(crate) fn build_full_signature(name: &str, inputs: &Type) -> String {
    let mut out = String::with_capacity(name.len() + 16);
    out.push_str(name);
    out.push('(');
    if let Some(elems) = inputs.as_tuple() {
        for (i, elem) in elems.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&elem.ty.canonical());
            if elem.indexed {
                out.push_str(" indexed");
            }
            if !elem.name.is_empty() {
                out.push(' ');
                out.push_str(&elem.name);
            }
        }
    }
    out.push(')');
    out
}

/// The smallest decimal-suffixed variant of `raw` for which `taken` is
/// false: `send`, then `send0`, `send1`, …
fn overloaded_name(raw: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(raw) {
        return raw.to_string();
    }
    let mut index = 0usize;
    loop {
        let candidate = format!("{raw}{index}");
        if !taken(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

/// One entry of the JSON descriptor array. Absent keys default; unknown
/// keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawItem {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    constant: bool,
    anonymous: bool,
    state_mutability: Option<String>,
    inputs: Vec<RawParam>,
    outputs: Vec<RawParam>,
}

/// One input/output entry: `{name, type, indexed, components}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawParam {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    indexed: bool,
    components: Vec<RawParam>,
}

/// Builds the inputs/outputs tuple from a descriptor parameter list.
fn params_type(params: &[RawParam]) -> Result<Type> {
    let elems = params
        .iter()
        .map(|param| {
            Ok(TupleElem {
                name: param.name.clone(),
                ty: param_type(param)?,
                indexed: param.indexed,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Type::Tuple(elems))
}

/// Builds one parameter's type. `tuple`-rooted types recurse through
/// `components`; any array suffix on the type string applies to the tuple.
fn param_type(param: &RawParam) -> Result<Type> {
    match param.kind.strip_prefix("tuple") {
        Some(suffixes) => {
            let elems = param
                .components
                .iter()
                .map(|component| {
                    Ok(TupleElem {
                        name: component.name.clone(),
                        ty: param_type(component)?,
                        indexed: component.indexed,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            crate::parse::parse_array_suffixes(Type::Tuple(elems), suffixes)
        }
        None => param.kind.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::hex;

    #[test]
    fn transfer_selector() {
        let method = Method::parse_signature("transfer(address,uint256)").unwrap();
        assert_eq!(method.id(), Selector::new(hex!("a9059cbb")));
        // The cached value is stable across queries.
        assert_eq!(method.id(), method.id());
    }

    #[test]
    fn signature_drops_names() {
        let inputs: Type = "tuple(address to,uint256 amount)".parse().unwrap();
        let method = Method::new("transfer", inputs, Type::Tuple(Vec::new()));
        assert_eq!(method.signature(), "transfer(address,uint256)");
        assert_eq!(method.id(), Selector::new(hex!("a9059cbb")));
    }

    #[test]
    fn full_signature_keeps_names() {
        let abi = Abi::from_json(
            r#"[{
                "type": "function",
                "name": "transfer",
                "inputs": [
                    {"name": "to", "type": "address"},
                    {"name": "amount", "type": "uint256"}
                ],
                "outputs": [{"name": "", "type": "bool"}]
            }]"#,
        )
        .unwrap();
        let method = abi.method("transfer").unwrap();
        assert_eq!(
            method.full_signature(),
            "transfer(address to,uint256 amount) returns (bool)"
        );
    }

    #[test]
    fn constant_from_state_mutability() {
        let abi = Abi::from_json(
            r#"[
                {"type": "function", "name": "a", "stateMutability": "view"},
                {"type": "function", "name": "b", "stateMutability": "pure"},
                {"type": "function", "name": "c", "stateMutability": "nonpayable"},
                {"type": "function", "name": "d", "constant": true}
            ]"#,
        )
        .unwrap();
        assert!(abi.method("a").unwrap().constant);
        assert!(abi.method("b").unwrap().constant);
        assert!(!abi.method("c").unwrap().constant);
        assert!(abi.method("d").unwrap().constant);
    }

    #[test]
    fn empty_type_is_function() {
        let abi = Abi::from_json(r#"[{"name": "poke"}]"#).unwrap();
        assert!(abi.method("poke").is_some());
    }

    #[test]
    fn overloads_renamed_deterministically() {
        let descriptor = r#"[
            {"type": "function", "name": "send", "inputs": [{"type": "uint256"}]},
            {"type": "function", "name": "send", "inputs": [{"type": "address"}]},
            {"type": "function", "name": "send", "inputs": [{"type": "bool"}]}
        ]"#;
        let abi = Abi::from_json(descriptor).unwrap();
        let keys: Vec<_> = abi.methods.keys().cloned().collect();
        assert_eq!(keys, ["send", "send0", "send1"]);
        assert_eq!(abi.method("send0").unwrap().signature(), "send(address)");

        // Deterministic across repeated parses.
        let again = Abi::from_json(descriptor).unwrap();
        assert_eq!(abi.methods, again.methods);
    }

    #[test]
    fn duplicate_constructor_rejected() {
        let err = Abi::from_json(
            r#"[{"type": "constructor"}, {"type": "constructor"}]"#,
        )
        .unwrap_err();
        assert_eq!(err, Error::Duplicate);
    }

    #[test]
    fn unknown_field_rejected() {
        let err = Abi::from_json(r#"[{"type": "delegate"}]"#).unwrap_err();
        assert_eq!(err, Error::UnknownField("delegate".to_string()));
    }

    #[test]
    fn ignored_entries() {
        let abi = Abi::from_json(
            r#"[
                {"type": "error", "name": "Unauthorized"},
                {"type": "fallback"},
                {"type": "receive"}
            ]"#,
        )
        .unwrap();
        assert!(abi.methods.is_empty());
        assert!(abi.events.is_empty());
    }

    #[test]
    fn tuple_components() {
        let abi = Abi::from_json(
            r#"[{
                "type": "function",
                "name": "submit",
                "inputs": [{
                    "name": "orders",
                    "type": "tuple[]",
                    "components": [
                        {"name": "amount", "type": "uint256"},
                        {"name": "to", "type": "address"}
                    ]
                }]
            }]"#,
        )
        .unwrap();
        let method = abi.method("submit").unwrap();
        assert_eq!(method.signature(), "submit(tuple(uint256,address)[])");
    }

    #[test]
    fn encode_input_prefixes_selector() {
        let method = Method::parse_signature("transfer(address,uint256)").unwrap();
        let data = method
            .abi_encode_input(&[
                Value::Address(crate::Address::ZERO),
                Value::from(1u64),
            ])
            .unwrap();
        assert_eq!(&data[..4], hex!("a9059cbb"));
        assert_eq!(data.len(), 4 + 64);
    }
}
