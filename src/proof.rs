//! Proof Format Validation
//!
//! Structural checks on a candidate proof before any verification attempt.
//! Nothing here is cryptographic: a well-formed proof is only one that is
//! non-empty and, when textual, valid hex or base64.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::Value;

/// Lenient base64 decoder: padding optional, trailing bits tolerated
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// A proof as supplied by a caller: raw bytes or an encoded string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proof {
    Bytes(Vec<u8>),
    Text(String),
}

impl From<&str> for Proof {
    fn from(s: &str) -> Self {
        Proof::Text(s.to_string())
    }
}

impl From<String> for Proof {
    fn from(s: String) -> Self {
        Proof::Text(s)
    }
}

impl From<Vec<u8>> for Proof {
    fn from(bytes: Vec<u8>) -> Self {
        Proof::Bytes(bytes)
    }
}

impl From<&[u8]> for Proof {
    fn from(bytes: &[u8]) -> Self {
        Proof::Bytes(bytes.to_vec())
    }
}

impl Proof {
    /// Parse a JSON proof value.
    ///
    /// Accepts a string, an array of bytes, or a serialized Node buffer
    /// (`{"type": "Buffer", "data": [...]}`). Anything else is `None`.
    pub fn from_json(value: &Value) -> Option<Proof> {
        match value {
            Value::String(s) => Some(Proof::Text(s.clone())),
            Value::Array(items) => bytes_from_json(items).map(Proof::Bytes),
            Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("Buffer") => {
                match map.get("data") {
                    Some(Value::Array(items)) => bytes_from_json(items).map(Proof::Bytes),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Length in bytes (binary) or characters (text)
    pub fn len(&self) -> usize {
        match self {
            Proof::Bytes(bytes) => bytes.len(),
            Proof::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalized lowercase hex of the proof bytes.
    ///
    /// Hex text is lowercased, base64 text is decoded first. `None` when the
    /// proof is not well-formed.
    pub fn to_hex(&self) -> Option<String> {
        match self {
            Proof::Bytes(bytes) if !bytes.is_empty() => Some(hex::encode(bytes)),
            Proof::Bytes(_) => None,
            Proof::Text(text) => {
                let trimmed = text.trim();
                if is_hex(trimmed) {
                    Some(trimmed.to_lowercase())
                } else if is_base64(trimmed) {
                    decode_base64(trimmed).map(hex::encode)
                } else {
                    None
                }
            }
        }
    }
}

fn bytes_from_json(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

/// Public inputs must be a JSON array of strings
pub fn public_inputs_from_json(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// Non-empty, even length, `[0-9a-fA-F]` only
pub fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.len() % 2 == 0 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Base64 alphabet with optional trailing padding, decoding to at least one byte
pub fn is_base64(s: &str) -> bool {
    let body = s.trim_end_matches('=');
    if body.is_empty() {
        return false;
    }
    if !body
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
    {
        return false;
    }
    decode_base64(s).is_some_and(|bytes| !bytes.is_empty())
}

fn decode_base64(s: &str) -> Option<Vec<u8>> {
    LENIENT_BASE64.decode(s.trim_end_matches('=')).ok()
}

/// Structural validity of a proof. Never performs cryptographic checks.
pub fn is_well_formed(proof: &Proof, _public_inputs: &[String]) -> bool {
    match proof {
        Proof::Bytes(bytes) => !bytes.is_empty(),
        Proof::Text(text) => {
            let trimmed = text.trim();
            !trimmed.is_empty() && (is_hex(trimmed) || is_base64(trimmed))
        }
    }
}
