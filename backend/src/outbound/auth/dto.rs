//! Wire types exchanged with the auth service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::ports::AuthenticatedSession;

#[derive(Debug, Deserialize)]
pub(super) struct SessionUserDto {
    pub uuid: Uuid,
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionDto {
    pub uuid: Option<Uuid>,
    #[serde(default)]
    pub readonly_access: bool,
}

/// Body of a successful session validation.
#[derive(Debug, Deserialize)]
pub(super) struct SessionValidationDto {
    pub user: SessionUserDto,
    pub session: Option<SessionDto>,
}

impl From<SessionValidationDto> for AuthenticatedSession {
    fn from(dto: SessionValidationDto) -> Self {
        Self {
            user_uuid: UserId::from_uuid(dto.user.uuid),
            session_uuid: dto.session.as_ref().and_then(|session| session.uuid),
            read_only_access: dto.session.is_some_and(|session| session.readonly_access),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct MfaSecretDto<'a> {
    pub item_uuid: Uuid,
    pub secret: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct SettingDto<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct RevisionHistoryDto {
    pub days: Option<u32>,
}
