//! Organization sites and blueprint imports.
//!
//! Flow Overview:
//! 1) Sites are registered per organization under a unique nice id.
//! 2) A blueprint import upserts every `client-resources` entry inside one store
//!    transaction; any failing entry discards the whole import.
//! 3) Mutating endpoints sit behind the CSRF guard like every other route.

mod client_resources;
mod error;
mod nice_id;
mod storage;
pub(crate) mod types;


pub use client_resources::update_client_resources;
pub use error::BlueprintError;
pub use storage::{BlueprintStore, MemoryStore, ResourceTransaction, StoreState};
pub use types::{
    ApplyBlueprintQuery, BlueprintConfig, ClientResourceResult, ClientResourceSpec,
    CreateSiteRequest, Protocol, Site, SiteResource, SiteResourceValues,
};

use axum::{
    Json,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info};

use self::nice_id::{NICE_ID_MAX, NICE_ID_MIN, normalize_nice_id};
use super::auth::ErrorResponse;

#[utoipa::path(
    post,
    path = "/api/v1/orgs/{org_id}/sites",
    request_body = CreateSiteRequest,
    params(
        ("org_id" = String, Path, description = "Organization id")
    ),
    responses(
        (status = 201, description = "Site created.", body = Site),
        (status = 400, description = "Invalid input.", body = ErrorResponse),
        (status = 403, description = "CSRF token missing or invalid.", body = ErrorResponse),
        (status = 409, description = "Site nice id already in use.", body = ErrorResponse),
    ),
    tag = "blueprints"
)]
pub async fn create_site(
    Path(org_id): Path<String>,
    store: Extension<Arc<MemoryStore>>,
    payload: Result<Json<CreateSiteRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection(&rejection),
    };

    let Some(nice_id) = normalize_nice_id(&payload.nice_id, NICE_ID_MIN, NICE_ID_MAX) else {
        return BlueprintError::InvalidNiceId.into_response();
    };
    let name = payload
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    match store.create_site(&org_id, &nice_id, name) {
        Ok(site) => {
            info!("Created site {} ({}) for org {}", site.nice_id, site.site_id, org_id);
            (StatusCode::CREATED, Json(site)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/orgs/{org_id}/blueprint",
    request_body = BlueprintConfig,
    params(
        ("org_id" = String, Path, description = "Organization id"),
        ApplyBlueprintQuery
    ),
    responses(
        (status = 200, description = "Blueprint applied.", body = [ClientResourceResult]),
        (status = 400, description = "Invalid blueprint or missing target site.", body = ErrorResponse),
        (status = 403, description = "CSRF token missing or invalid.", body = ErrorResponse),
        (status = 404, description = "Target site not found.", body = ErrorResponse),
        (status = 409, description = "Client resource already bound to another site.", body = ErrorResponse),
    ),
    tag = "blueprints"
)]
pub async fn apply_blueprint(
    Path(org_id): Path<String>,
    Query(query): Query<ApplyBlueprintQuery>,
    store: Extension<Arc<MemoryStore>>,
    payload: Result<Json<BlueprintConfig>, JsonRejection>,
) -> impl IntoResponse {
    let Json(config) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection(&rejection),
    };

    debug!(
        "Applying blueprint with {} client resources to org {}",
        config.client_resources.len(),
        org_id
    );

    match store.transaction(|trx| update_client_resources(&org_id, &config, trx, query.site_id)) {
        Ok(results) => (StatusCode::OK, Json(results)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/orgs/{org_id}/client-resources",
    params(
        ("org_id" = String, Path, description = "Organization id")
    ),
    responses(
        (status = 200, description = "Client resources of the organization.", body = [SiteResource]),
    ),
    tag = "blueprints"
)]
pub async fn list_client_resources(
    Path(org_id): Path<String>,
    store: Extension<Arc<MemoryStore>>,
) -> impl IntoResponse {
    (StatusCode::OK, Json(store.list_resources(&org_id))).into_response()
}

fn json_rejection(rejection: &JsonRejection) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(rejection.body_text())),
    )
        .into_response()
}
