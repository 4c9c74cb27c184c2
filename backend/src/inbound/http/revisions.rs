//! Revision history endpoints.
//!
//! ```text
//! GET    /v1/items/{item_uuid}/revisions
//! GET    /v1/items/{item_uuid}/revisions/{revision_uuid}
//! DELETE /v1/items/{item_uuid}/revisions/{revision_uuid}
//! ```

use actix_web::{HttpResponse, delete, get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::timer::format_date;
use crate::domain::{Error, Revision};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerSession;
use crate::inbound::http::state::HttpState;

/// Revision listing entry. Content is fetched one revision at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RevisionSummary {
    pub uuid: Uuid,
    pub content_type: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Revision> for RevisionSummary {
    fn from(revision: &Revision) -> Self {
        Self {
            uuid: revision.uuid,
            content_type: revision.content_type.to_string(),
            created_at: format_date(&revision.created_at),
            updated_at: format_date(&revision.updated_at),
        }
    }
}

/// Full revision including its encrypted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RevisionBody {
    pub uuid: Uuid,
    pub item_uuid: Uuid,
    pub content: Option<String>,
    pub content_type: String,
    pub items_key_id: Option<String>,
    pub enc_item_key: Option<String>,
    pub auth_hash: Option<String>,
    pub creation_date: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Revision> for RevisionBody {
    fn from(revision: Revision) -> Self {
        Self {
            uuid: revision.uuid,
            item_uuid: revision.item_uuid,
            content_type: revision.content_type.to_string(),
            creation_date: revision.creation_date.to_string(),
            created_at: format_date(&revision.created_at),
            updated_at: format_date(&revision.updated_at),
            content: revision.content,
            items_key_id: revision.items_key_id,
            enc_item_key: revision.enc_item_key,
            auth_hash: revision.auth_hash,
        }
    }
}

/// List the revisions of an item within the caller's history window.
#[utoipa::path(
    get,
    path = "/v1/items/{item_uuid}/revisions",
    params(("item_uuid" = Uuid, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Revisions, newest first", body = [RevisionSummary]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Item not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["revisions"],
    operation_id = "listRevisions"
)]
#[get("/items/{item_uuid}/revisions")]
pub async fn list_revisions(
    state: web::Data<HttpState>,
    session: BearerSession,
    path: web::Path<Uuid>,
) -> ApiResult<web::Json<Vec<RevisionSummary>>> {
    let item_uuid = path.into_inner();
    let revisions = state
        .revisions
        .get_revisions(session.user_uuid(), &item_uuid)
        .await?;
    Ok(web::Json(revisions.iter().map(RevisionSummary::from).collect()))
}

/// Fetch one revision with its content.
#[utoipa::path(
    get,
    path = "/v1/items/{item_uuid}/revisions/{revision_uuid}",
    params(
        ("item_uuid" = Uuid, Path, description = "Item identifier"),
        ("revision_uuid" = Uuid, Path, description = "Revision identifier")
    ),
    responses(
        (status = 200, description = "Revision", body = RevisionBody),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Item or revision not found", body = Error)
    ),
    tags = ["revisions"],
    operation_id = "getRevision"
)]
#[get("/items/{item_uuid}/revisions/{revision_uuid}")]
pub async fn get_revision(
    state: web::Data<HttpState>,
    session: BearerSession,
    path: web::Path<(Uuid, Uuid)>,
) -> ApiResult<web::Json<RevisionBody>> {
    let (item_uuid, revision_uuid) = path.into_inner();
    let revision = state
        .revisions
        .get_revision(session.user_uuid(), &item_uuid, &revision_uuid)
        .await?;
    Ok(web::Json(RevisionBody::from(revision)))
}

/// Delete one revision.
#[utoipa::path(
    delete,
    path = "/v1/items/{item_uuid}/revisions/{revision_uuid}",
    params(
        ("item_uuid" = Uuid, Path, description = "Item identifier"),
        ("revision_uuid" = Uuid, Path, description = "Revision identifier")
    ),
    responses(
        (status = 204, description = "Revision removed"),
        (status = 400, description = "Read-only session", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Item or revision not found", body = Error)
    ),
    tags = ["revisions"],
    operation_id = "deleteRevision"
)]
#[delete("/items/{item_uuid}/revisions/{revision_uuid}")]
pub async fn delete_revision(
    state: web::Data<HttpState>,
    session: BearerSession,
    path: web::Path<(Uuid, Uuid)>,
) -> ApiResult<HttpResponse> {
    if session.read_only_access() {
        return Err(Error::forbidden("session has read-only access"));
    }
    let (item_uuid, revision_uuid) = path.into_inner();
    state
        .revisions_command
        .remove_revision(session.user_uuid(), &item_uuid, &revision_uuid)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
