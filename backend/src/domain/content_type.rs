//! Item content types understood by the server.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic kind of an item.
///
/// The wire tag is an opaque string chosen by clients. Only the tags listed
/// here are accepted on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContentType {
    /// Generic item placeholder.
    Item,
    /// Device-local root key. Never synced in practice but still a known tag.
    RootKey,
    /// Key used to encrypt other items.
    ItemsKey,
    /// Encrypted local storage blob.
    EncryptedStorage,
    /// User note.
    Note,
    /// Tag attached to notes.
    Tag,
    /// Saved search.
    SmartTag,
    /// Editor or other UI component.
    Component,
    /// Legacy editor definition.
    Editor,
    /// Action extension.
    ActionsExtension,
    /// User preferences.
    UserPreferences,
    /// Privileges settings.
    Privileges,
    /// History session settings.
    HistorySession,
    /// Theme component.
    Theme,
    /// Legacy two-factor secret, migrated to the auth service on save.
    Mfa,
    /// Server-side extension configuration.
    ServerExtension,
    /// FileSafe credentials.
    FileSafeCredentials,
    /// FileSafe file metadata.
    FileSafeFileMetadata,
    /// FileSafe integration settings.
    FileSafeIntegration,
    /// Extension repository.
    ExtensionRepo,
}

/// Raised when a content type tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown content type: {0}")]
pub struct UnknownContentType(pub String);

impl ContentType {
    /// Wire tag for this content type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Item => "SF|Item",
            Self::RootKey => "SN|RootKey|NoSync",
            Self::ItemsKey => "SN|ItemsKey",
            Self::EncryptedStorage => "SN|EncryptedStorage",
            Self::Note => "Note",
            Self::Tag => "Tag",
            Self::SmartTag => "SN|SmartTag",
            Self::Component => "SN|Component",
            Self::Editor => "SN|Editor",
            Self::ActionsExtension => "Extension",
            Self::UserPreferences => "SN|UserPreferences",
            Self::Privileges => "SN|Privileges",
            Self::HistorySession => "SN|HistorySession",
            Self::Theme => "SN|Theme",
            Self::Mfa => "SF|MFA",
            Self::ServerExtension => "SF|Extension",
            Self::FileSafeCredentials => "SN|FileSafe|Credentials",
            Self::FileSafeFileMetadata => "SN|FileSafe|FileMetadata",
            Self::FileSafeIntegration => "SN|FileSafe|Integration",
            Self::ExtensionRepo => "SN|ExtensionRepo",
        }
    }

    const ALL: [Self; 20] = [
        Self::Item,
        Self::RootKey,
        Self::ItemsKey,
        Self::EncryptedStorage,
        Self::Note,
        Self::Tag,
        Self::SmartTag,
        Self::Component,
        Self::Editor,
        Self::ActionsExtension,
        Self::UserPreferences,
        Self::Privileges,
        Self::HistorySession,
        Self::Theme,
        Self::Mfa,
        Self::ServerExtension,
        Self::FileSafeCredentials,
        Self::FileSafeFileMetadata,
        Self::FileSafeIntegration,
        Self::ExtensionRepo,
    ];
}

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == s)
            .ok_or_else(|| UnknownContentType(s.to_owned()))
    }
}

impl TryFrom<String> for ContentType {
    type Error = UnknownContentType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentType> for String {
    fn from(value: ContentType) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
