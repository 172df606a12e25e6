// src/db/report_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::reports::{NewReportRun, ScheduledReport},
};

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledReport>, AppError>;

    /// Documentos da empresa, um objeto JSON por linha, na ordem das colunas da tabela.
    async fn export_documents(
        &self,
        company_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Map<String, Value>>, AppError>;

    async fn log_run(&self, run: &NewReportRun) -> Result<(), AppError>;

    async fn reschedule(&self, report_id: Uuid, next_run_at: DateTime<Utc>) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for ReportRepository {
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledReport>, AppError> {
        let reports = sqlx::query_as::<_, ScheduledReport>(
            r#"
            SELECT id, company_id, ativo, next_run_at, periodicidade, filtros
            FROM scheduled_reports
            WHERE ativo = TRUE AND next_run_at <= $1
            ORDER BY next_run_at ASC
            "#,
        )
            .bind(now)
            .fetch_all(&self.pool)
            .await?;

        Ok(reports)
    }

    async fn export_documents(
        &self,
        company_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Map<String, Value>>, AppError> {
        // row_to_json (json, não jsonb) preserva a ordem das colunas
        let rows: Vec<(Value,)> = sqlx::query_as(
            r#"
            SELECT row_to_json(d)
            FROM documents d
            WHERE d.company_id = $1
            ORDER BY d.emissao_data NULLS LAST
            LIMIT $2
            "#,
        )
            .bind(company_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(row,)| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }

    async fn log_run(&self, run: &NewReportRun) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO report_runs (company_id, report_id, status, file_url) VALUES ($1, $2, $3, $4)",
        )
            .bind(run.company_id)
            .bind(run.report_id)
            .bind(run.status())
            .bind(run.file_url())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn reschedule(&self, report_id: Uuid, next_run_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE scheduled_reports SET next_run_at = $1 WHERE id = $2")
            .bind(next_run_at)
            .bind(report_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
