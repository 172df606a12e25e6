// src/handlers/automations.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use crate::{common::error::AppError, config::AppState, models::automation::AutomationRunSummary};

// Qualquer método: /run_automations (cron ou webhook)
pub async fn run_automations(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let processed = app_state.automation_service.run_batch(Utc::now()).await?;

    let message = processed.is_empty().then_some("No pending events");
    Ok((StatusCode::OK, Json(AutomationRunSummary { message, processed })))
}
