//! Sync endpoint.
//!
//! ```text
//! POST /v1/items/sync {"items":[...],"sync_token":"...","api":"20200115"}
//! ```

use actix_web::http::header::USER_AGENT;
use actix_web::{HttpRequest, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::SyncItemsRequest;
use crate::domain::sync_response::SyncResponse;
use crate::domain::{ContentType, Error, ItemHash};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerSession;
use crate::inbound::http::schemas::SyncResponseSchema;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /v1/items/sync`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SyncItemsBody {
    /// Items the client changed since its last sync.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<ItemHash>,
    pub sync_token: Option<String>,
    pub cursor_token: Option<String>,
    pub limit: Option<i64>,
    /// Restrict retrieved items to one content type, e.g. `SN|ItemsKey`.
    pub content_type: Option<String>,
    /// API version; blank selects the legacy response shape.
    pub api: Option<String>,
    #[serde(default)]
    pub compute_integrity: bool,
}

fn parse_content_type(raw: Option<String>) -> Result<Option<ContentType>, Error> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| {
            value.parse::<ContentType>().map_err(|_| {
                Error::invalid_request("unknown content type")
                    .with_details(json!({ "field": "content_type", "value": value }))
            })
        })
        .transpose()
}

fn user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Save the client's items and return everything changed since its token.
#[utoipa::path(
    post,
    path = "/v1/items/sync",
    request_body = SyncItemsBody,
    responses(
        (status = 200, description = "Sync result in the requested API shape", body = SyncResponseSchema),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Dependency unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["items"],
    operation_id = "syncItems"
)]
#[post("/items/sync")]
pub async fn sync_items(
    state: web::Data<HttpState>,
    session: BearerSession,
    req: HttpRequest,
    payload: web::Json<SyncItemsBody>,
) -> ApiResult<web::Json<SyncResponse>> {
    let body = payload.into_inner();
    let mut request = SyncItemsRequest::new(session.user_uuid().clone());
    request.read_only_access = session.read_only_access();
    request.content_type = parse_content_type(body.content_type)?;
    request.api_version = body.api;
    request.items = body.items;
    request.sync_token = body.sync_token;
    request.cursor_token = body.cursor_token;
    request.limit = body.limit;
    request.compute_integrity_hash = body.compute_integrity;
    request.user_agent = user_agent(&req);

    let response = state.sync_items.sync_items(request).await?;
    Ok(web::Json(response))
}
