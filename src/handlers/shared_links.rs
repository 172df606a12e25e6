// src/handlers/shared_links.rs

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::shared_links::SharedLinkQuery,
    services::shared_link_service::{LinkAction, LinkResolution},
};

// GET|POST /public_shared_link_handler?token=...&action=download
pub async fn resolve_shared_link(
    State(app_state): State<AppState>,
    Query(query): Query<SharedLinkQuery>,
) -> Result<Response, AppError> {
    query.validate()?;

    let token = query.token.as_deref().unwrap_or_default();
    let action = LinkAction::from_param(query.action.as_deref());

    let resolution = app_state
        .shared_link_service
        .resolve(token, action, Utc::now())
        .await?;

    match resolution {
        LinkResolution::Metadata(view) => Ok((StatusCode::OK, Json(view)).into_response()),
        LinkResolution::Redirect(url) => {
            Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
        }
    }
}
