//! Opaque sync and cursor tokens for item synchronisation.
//!
//! Clients receive a token at the end of every sync and hand it back on the
//! next request. The server treats the token as a lower bound on
//! `updated_at_timestamp` when selecting items to return.
//!
//! # Wire format
//!
//! A token is the standard base64 encoding of the ASCII string
//! `{version}:{value}`:
//!
//! - version `2`: `value` is fractional Unix seconds with up to six
//!   fractional digits, so a microsecond timestamp survives the round trip;
//! - version `1`: `value` is a date string. Interpreting it is left to the
//!   caller, which owns date parsing.
//!
//! # Examples
//! ```
//! use pagination::{SyncToken, TokenVersion};
//!
//! let token = SyncToken::from_micros(1_615_798_800_000_001);
//! let decoded = SyncToken::decode(&token.encode()).expect("valid token");
//! assert_eq!(decoded.version(), TokenVersion::Seconds);
//! assert_eq!(decoded.value(), "1615798800.000001");
//! assert_eq!(decoded.seconds_as_micros(), Ok(1_615_798_800_000_001));
//! ```

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

const MICROS_PER_SECOND: i64 = 1_000_000;
const FRACTION_DIGITS: usize = 6;

/// Errors raised while decoding or interpreting a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token is not valid base64 or does not decode to UTF-8.
    #[error("sync token is not valid base64 text")]
    Encoding,
    /// The decoded token has no recognised `{version}:` prefix.
    #[error("Sync token is missing version part")]
    MissingVersion,
    /// The value cannot be read as fractional Unix seconds.
    #[error("sync token value is not a valid timestamp: {value}")]
    InvalidValue {
        /// Raw value carried by the token.
        value: String,
    },
}

/// Token format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenVersion {
    /// Version `1`: the value is a date string.
    DateString,
    /// Version `2`: the value is fractional Unix seconds.
    Seconds,
}

impl TokenVersion {
    /// Wire representation of the version.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DateString => "1",
            Self::Seconds => "2",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "1" => Some(Self::DateString),
            "2" => Some(Self::Seconds),
            _ => None,
        }
    }
}

/// Decoded sync or cursor token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncToken {
    version: TokenVersion,
    value: String,
}

impl SyncToken {
    /// Build a version `2` token from a microsecond Unix timestamp.
    ///
    /// The value is rendered exactly, without trailing fractional zeros.
    #[must_use]
    pub fn from_micros(micros: i64) -> Self {
        let seconds = micros.div_euclid(MICROS_PER_SECOND);
        let fraction = micros.rem_euclid(MICROS_PER_SECOND);
        let value = if fraction == 0 {
            seconds.to_string()
        } else {
            let padded = format!("{seconds}.{fraction:06}");
            padded.trim_end_matches('0').to_owned()
        };
        Self {
            version: TokenVersion::Seconds,
            value,
        }
    }

    /// Build a version `1` token carrying a date string.
    #[must_use]
    pub fn from_date_string(value: impl Into<String>) -> Self {
        Self {
            version: TokenVersion::DateString,
            value: value.into(),
        }
    }

    /// Decode a token received from a client.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] when the input is not base64 text and
    /// [`TokenError::MissingVersion`] when the version prefix is absent or
    /// unknown.
    pub fn decode(encoded: &str) -> Result<Self, TokenError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| TokenError::Encoding)?;
        let text = String::from_utf8(bytes).map_err(|_| TokenError::Encoding)?;
        let (raw_version, value) = text.split_once(':').ok_or(TokenError::MissingVersion)?;
        let version = TokenVersion::parse(raw_version).ok_or(TokenError::MissingVersion)?;
        Ok(Self {
            version,
            value: value.to_owned(),
        })
    }

    /// Encode the token for the wire.
    #[must_use]
    pub fn encode(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.version.as_str(), self.value))
    }

    /// Token format version.
    #[must_use]
    pub const fn version(&self) -> TokenVersion {
        self.version
    }

    /// Raw value carried after the version prefix.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Interpret a version `2` value as a microsecond Unix timestamp.
    ///
    /// Fractional digits beyond microsecond precision are truncated.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidValue`] when the token is not version `2`
    /// or its value is not non-negative fractional seconds.
    pub fn seconds_as_micros(&self) -> Result<i64, TokenError> {
        if self.version != TokenVersion::Seconds {
            return Err(self.invalid_value());
        }
        let (whole, fraction) = self
            .value
            .split_once('.')
            .unwrap_or((self.value.as_str(), ""));
        if !is_ascii_digits(whole) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(self.invalid_value());
        }
        let seconds: i64 = whole.parse().map_err(|_| self.invalid_value())?;
        let mut padded: String = fraction.chars().take(FRACTION_DIGITS).collect();
        while padded.len() < FRACTION_DIGITS {
            padded.push('0');
        }
        let micros: i64 = padded.parse().map_err(|_| self.invalid_value())?;
        seconds
            .checked_mul(MICROS_PER_SECOND)
            .and_then(|total| total.checked_add(micros))
            .ok_or_else(|| self.invalid_value())
    }

    fn invalid_value(&self) -> TokenError {
        TokenError::InvalidValue {
            value: self.value.clone(),
        }
    }
}

fn is_ascii_digits(raw: &str) -> bool {
    !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit())
}

impl fmt::Display for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
