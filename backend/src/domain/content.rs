//! Codec for versioned, base64-wrapped item content.
//!
//! Server-readable items (extension configs, legacy MFA secrets) store their
//! payload as a three character version prefix followed by base64 encoded
//! JSON, for example `004eyJzZWNyZXQiOiJzaGhoaCJ9`. Decoding is lenient:
//! anything malformed decodes to an empty payload and callers treat missing
//! fields as absent.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};

const VERSION_PREFIX_LEN: usize = 3;
const CURRENT_VERSION_PREFIX: &str = "004";

/// How often an extension wants to receive synced items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionFrequency {
    /// Push after every sync.
    Realtime,
    /// Batched daily delivery.
    Daily,
    /// Any other value sent by the client.
    Other(String),
}

impl ExtensionFrequency {
    fn parse(raw: &str) -> Self {
        match raw {
            "realtime" => Self::Realtime,
            "daily" => Self::Daily,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Decoded item payload with the fields the server cares about lifted out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedContent {
    /// Extension delivery frequency.
    pub frequency: Option<ExtensionFrequency>,
    /// Extension subtype, e.g. `backup.email-archive`.
    pub subtype: Option<String>,
    /// Extension endpoint.
    pub url: Option<String>,
    /// Legacy two-factor shared secret.
    pub secret: Option<String>,
    /// Display name.
    pub name: Option<String>,
    raw: Map<String, Value>,
}

impl DecodedContent {
    fn from_map(raw: Map<String, Value>) -> Self {
        let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_owned);
        Self {
            frequency: raw
                .get("frequency")
                .and_then(Value::as_str)
                .map(ExtensionFrequency::parse),
            subtype: text("subtype"),
            url: text("url"),
            secret: text("secret"),
            name: text("name"),
            raw,
        }
    }

    /// Whether decoding produced no fields at all.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Look up any decoded field, known or not.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Whether the payload asks for realtime delivery.
    pub fn is_realtime(&self) -> bool {
        self.frequency == Some(ExtensionFrequency::Realtime)
    }
}

/// Decode versioned content. Never fails; malformed input yields an empty
/// payload.
///
/// # Examples
/// ```
/// use syncing_server::domain::content::{decode, encode};
/// use serde_json::json;
///
/// let decoded = decode(&encode(&json!({ "secret": "shhhh" })));
/// assert_eq!(decoded.secret.as_deref(), Some("shhhh"));
/// assert!(decode("garbage").is_empty());
/// ```
pub fn decode(content: &str) -> DecodedContent {
    content
        .get(VERSION_PREFIX_LEN..)
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .map(DecodedContent::from_map)
        .unwrap_or_default()
}

/// Encode a JSON payload with the current version prefix.
pub fn encode(payload: &Value) -> String {
    format!(
        "{CURRENT_VERSION_PREFIX}{}",
        STANDARD.encode(payload.to_string())
    )
}
