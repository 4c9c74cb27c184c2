//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the sync, revision and health endpoints together with
//! the bearer token security scheme. Swagger UI serves it in debug builds.

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::items::SyncItemsBody;
use crate::inbound::http::revisions::{RevisionBody, RevisionSummary};
use crate::inbound::http::schemas::SyncResponseSchema;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Session token issued by the auth service."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Syncing server API",
        description = "Item sync, revision history and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::items::sync_items,
        crate::inbound::http::revisions::list_revisions,
        crate::inbound::http::revisions::get_revision,
        crate::inbound::http::revisions::delete_revision,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        SyncItemsBody,
        SyncResponseSchema,
        RevisionSummary,
        RevisionBody
    )),
    tags(
        (name = "items", description = "Item synchronisation"),
        (name = "revisions", description = "Note revision history"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
