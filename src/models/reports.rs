// src/models/reports.rs

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_periodicity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Periodicidade {
    Daily,
    Weekly,
    Monthly,
}

impl Periodicidade {
    /// Próxima execução contada a partir de `now`.
    /// No mensal, dias inexistentes caem no último dia do mês (31/01 -> 29/02).
    pub fn next_run_after(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Periodicidade::Daily => now + Duration::days(1),
            Periodicidade::Weekly => now + Duration::days(7),
            Periodicidade::Monthly => now
                .checked_add_months(Months::new(1))
                .unwrap_or(now + Duration::days(31)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduledReport {
    pub id: Uuid,
    pub company_id: Uuid,
    pub ativo: bool,
    pub next_run_at: DateTime<Utc>,
    pub periodicidade: Periodicidade,
    // Reservado para filtros de exportação; ainda não aplicado na consulta
    pub filtros: Option<Value>,
}

/// Resultado de uma execução, como gravado em `report_runs.status`.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Success { file_url: String },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReportRun {
    pub company_id: Uuid,
    pub report_id: Uuid,
    pub outcome: RunOutcome,
}

impl NewReportRun {
    pub fn status(&self) -> String {
        match &self.outcome {
            RunOutcome::Success { .. } => "success".to_string(),
            RunOutcome::Failed(message) => format!("failed: {}", message),
        }
    }

    pub fn file_url(&self) -> Option<&str> {
        match &self.outcome {
            RunOutcome::Success { file_url } => Some(file_url),
            RunOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportRunSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub processed: usize,
}
