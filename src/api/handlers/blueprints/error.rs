use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::handlers::auth::ErrorResponse;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlueprintError {
    #[error("Target site is required")]
    TargetSiteRequired,
    #[error("Site not found: {site} in org {org_id}")]
    SiteNotFound { site: String, org_id: String },
    #[error(
        "Duplicate client resource name '{nice_id}': This resource name is already in use on site [{existing_site}]. Please use a unique name for this resource on site [{current_site}] to avoid conflicts. Suggestion: rename to '{suggestion}'."
    )]
    DuplicateResource {
        nice_id: String,
        existing_site: String,
        current_site: String,
        suggestion: String,
    },
    #[error("Site '{nice_id}' already exists in org {org_id}")]
    DuplicateSite { nice_id: String, org_id: String },
    #[error("Invalid site nice id")]
    InvalidNiceId,
    #[error("Client resource {0} disappeared during the import")]
    ResourceMissing(i64),
}

impl BlueprintError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::TargetSiteRequired | Self::InvalidNiceId => StatusCode::BAD_REQUEST,
            Self::SiteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::DuplicateResource { .. } | Self::DuplicateSite { .. } => StatusCode::CONFLICT,
            Self::ResourceMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BlueprintError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse::new(self.to_string())),
        )
            .into_response()
    }
}
