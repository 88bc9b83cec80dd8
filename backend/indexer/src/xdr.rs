//! Just enough `ScVal` to read the contract's events.
//!
//! The indexer asks `getEvents` for `xdrFormat: "json"`, which renders every
//! `ScVal` as a single-key object such as `{"symbol":"funded"}`,
//! `{"i128":"5000"}` or `{"map":[{"key":..,"val":..}]}`. [`plain`] flattens
//! that into ordinary JSON so a struct payload reads as `{"amount":"5000",..}`.
//!
//! Older RPCs ignore the format flag and send base64 XDR. For those only the
//! topics are decoded ([`decode_topic`]): the contract puts a `Symbol` first
//! and, for project-scoped events, a `u64` project id second.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};

const SCV_U32: u32 = 3;
const SCV_U64: u32 = 5;
const SCV_SYMBOL: u32 = 15;

/// Longest symbol the host accepts.
const MAX_SYMBOL_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicValue {
    Symbol(String),
    U32(u32),
    U64(u64),
}

/// Decode one base64 XDR topic, or `None` when it is not base64 or not a
/// shape we understand.
pub fn decode_topic(encoded: &str) -> Option<TopicValue> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    let (discriminant, body) = split_u32(&bytes)?;
    match discriminant {
        SCV_SYMBOL => {
            let (len, rest) = split_u32(body)?;
            let len = len as usize;
            if len > MAX_SYMBOL_LEN || rest.len() < len {
                return None;
            }
            let symbol = std::str::from_utf8(&rest[..len]).ok()?;
            Some(TopicValue::Symbol(symbol.to_string()))
        }
        SCV_U64 => {
            let raw: [u8; 8] = body.get(..8)?.try_into().ok()?;
            Some(TopicValue::U64(u64::from_be_bytes(raw)))
        }
        SCV_U32 => split_u32(body).map(|(n, _)| TopicValue::U32(n)),
        _ => None,
    }
}

fn split_u32(bytes: &[u8]) -> Option<(u32, &[u8])> {
    let head: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    Some((u32::from_be_bytes(head), &bytes[4..]))
}

/// Flatten a JSON-form `ScVal` into plain JSON. Maps become objects keyed by
/// their (symbol) keys, 64-bit and wider integers become decimal strings,
/// 32-bit integers stay numbers. Unrecognised shapes are returned unchanged.
pub fn plain(value: &Value) -> Value {
    let Some((tag, inner)) = single_entry(value) else {
        return match value {
            Value::String(s) if s == "void" => Value::Null,
            other => other.clone(),
        };
    };
    match tag {
        "map" => {
            let mut object = Map::new();
            for entry in inner.as_array().into_iter().flatten() {
                let (Some(key), Some(val)) = (entry.get("key"), entry.get("val")) else {
                    continue;
                };
                let key = match plain(key) {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                object.insert(key, plain(val));
            }
            Value::Object(object)
        }
        "vec" => Value::Array(inner.as_array().into_iter().flatten().map(plain).collect()),
        "symbol" | "string" | "address" => inner.clone(),
        "bool" | "u32" | "i32" => inner.clone(),
        "u64" | "i64" | "timepoint" | "duration" | "u128" | "i128" | "u256" | "i256" => {
            wide_integer(inner).map(Value::String).unwrap_or_else(|| inner.clone())
        }
        _ => value.clone(),
    }
}

/// Topic value from its JSON form.
pub fn json_topic(value: &Value) -> Option<TopicValue> {
    let (tag, inner) = single_entry(value)?;
    match tag {
        "symbol" => inner.as_str().map(|s| TopicValue::Symbol(s.to_string())),
        "u64" => wide_integer(inner)?.parse().ok().map(TopicValue::U64),
        "u32" => inner.as_u64()?.try_into().ok().map(TopicValue::U32),
        _ => None,
    }
}

fn single_entry(value: &Value) -> Option<(&str, &Value)> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.iter().next().map(|(k, v)| (k.as_str(), v))
}

/// Decimal text of an integer given as a number, a string, or `{hi, lo}` parts.
fn wide_integer(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(parts) => {
            let lo = parts.get("lo")?.as_u64()?;
            let hi = parts.get("hi")?;
            if let Some(hi) = hi.as_i64() {
                Some(((i128::from(hi) << 64) | i128::from(lo)).to_string())
            } else {
                let hi = hi.as_u64()?;
                Some(((u128::from(hi) << 64) | u128::from(lo)).to_string())
            }
        }
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn encode_symbol(symbol: &str) -> String {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&SCV_SYMBOL.to_be_bytes());
    bytes.extend_from_slice(&(symbol.len() as u32).to_be_bytes());
    bytes.extend_from_slice(symbol.as_bytes());
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    STANDARD.encode(bytes)
}

#[cfg(test)]
pub(crate) fn encode_u64(n: u64) -> String {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&SCV_U64.to_be_bytes());
    bytes.extend_from_slice(&n.to_be_bytes());
    STANDARD.encode(bytes)
}
