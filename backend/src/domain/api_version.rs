//! Client API versions that shape sync behaviour and responses.

use std::fmt;

use super::Error;

/// Sync API version sent by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// Oldest protocol: string dates, flat `unsaved` conflicts.
    V20161215,
    /// Structured conflicts.
    V20190520,
    /// Structured conflicts with microsecond timestamps.
    V20200115,
}

impl ApiVersion {
    /// Wire form of the version.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V20161215 => "20161215",
            Self::V20190520 => "20190520",
            Self::V20200115 => "20200115",
        }
    }

    /// Resolve the version sent by a client.
    ///
    /// An absent or blank version selects the legacy protocol. Any other
    /// unrecognised value is rejected.
    ///
    /// # Examples
    /// ```
    /// use syncing_server::domain::ApiVersion;
    ///
    /// assert_eq!(ApiVersion::resolve(None).ok(), Some(ApiVersion::V20161215));
    /// assert!(ApiVersion::resolve(Some("1999")).is_err());
    /// ```
    pub fn resolve(raw: Option<&str>) -> Result<Self, Error> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::V20161215),
            Some("20161215") => Ok(Self::V20161215),
            Some("20190520") => Ok(Self::V20190520),
            Some("20200115") => Ok(Self::V20200115),
            Some(other) => Err(Error::invalid_request("Not supported api version")
                .with_details(serde_json::json!({ "api": other }))),
        }
    }

    /// Whether this is the oldest, string-date based protocol.
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::V20161215)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
