// src/handlers/reports.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use crate::{common::error::AppError, config::AppState, models::reports::ReportRunSummary};

// Qualquer método: /run_reports (cron diário)
pub async fn run_reports(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let processed = app_state.report_service.run_due(Utc::now()).await?;

    let message = (processed == 0).then_some("No reports due");
    Ok((StatusCode::OK, Json(ReportRunSummary { message, processed })))
}
