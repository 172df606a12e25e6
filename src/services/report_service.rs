// src/services/report_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::{Map, Value};

use crate::{
    common::error::AppError,
    db::ReportStore,
    models::reports::{NewReportRun, RunOutcome, ScheduledReport},
    storage::BlobStorage,
};

// Limite fixo de linhas por exportação
pub const EXPORT_ROW_LIMIT: i64 = 100;

const CSV_CONTENT_TYPE: &str = "text/csv";

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn ReportStore>,
    storage: Arc<dyn BlobStorage>,
    reports_bucket: String,
}

impl ReportService {
    pub fn new(
        store: Arc<dyn ReportStore>,
        storage: Arc<dyn BlobStorage>,
        reports_bucket: String,
    ) -> Self {
        Self { store, storage, reports_bucket }
    }

    /// Executa todos os relatórios vencidos em `now` e devolve quantos foram processados.
    pub async fn run_due(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let reports = self.store.find_due(now).await?;

        for report in &reports {
            let outcome = match self.export(report, now).await {
                Ok(file_url) => RunOutcome::Success { file_url },
                Err(e) => {
                    tracing::error!(report_id = %report.id, error = %e, "Falha ao gerar relatório agendado");
                    RunOutcome::Failed(e.to_string())
                }
            };
            let succeeded = matches!(outcome, RunOutcome::Success { .. });

            let run = NewReportRun {
                company_id: report.company_id,
                report_id: report.id,
                outcome,
            };
            if let Err(e) = self.store.log_run(&run).await {
                tracing::error!(report_id = %report.id, error = %e, "Não foi possível registrar a execução");
            }

            // Reagenda apenas quando a exportação deu certo, mesmo com zero linhas
            if succeeded {
                let next_run_at = report.periodicidade.next_run_after(now);
                if let Err(e) = self.store.reschedule(report.id, next_run_at).await {
                    tracing::error!(report_id = %report.id, error = %e, "Não foi possível reagendar o relatório");
                }
            }
        }

        Ok(reports.len())
    }

    async fn export(&self, report: &ScheduledReport, now: DateTime<Utc>) -> Result<String, AppError> {
        let rows = self
            .store
            .export_documents(report.company_id, EXPORT_ROW_LIMIT)
            .await?;

        let content = render_csv(&rows)?;
        let path = report_path(report, now);

        self.storage
            .upload(&self.reports_bucket, &path, content.into_bytes(), CSV_CONTENT_TYPE)
            .await?;

        tracing::info!(report_id = %report.id, rows = rows.len(), path = %path, "Relatório exportado");
        Ok(path)
    }
}

pub fn report_path(report: &ScheduledReport, now: DateTime<Utc>) -> String {
    format!(
        "{}/reports/{}_{}.csv",
        report.company_id,
        report.id,
        now.timestamp_millis()
    )
}

/// Gera o CSV: cabeçalho com as colunas do primeiro registro e valores
/// sempre entre aspas, com aspas internas duplicadas. Sem registros, vazio.
pub fn render_csv(rows: &[Map<String, Value>]) -> Result<String, AppError> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut header = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header.write_record(&headers).map_err(csv_error)?;

    let mut body = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        body.write_record(headers.iter().map(|h| cell(row.get(*h))))
            .map_err(csv_error)?;
    }

    let mut out = into_string(header)?;
    out.push_str(&into_string(body)?);

    // Linhas unidas por '\n', sem quebra final
    let trimmed_len = out.trim_end_matches(['\r', '\n']).len();
    out.truncate(trimmed_len);
    Ok(out)
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String, AppError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar CSV: {}", e))?;
    String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("CSV inválido: {}", e).into())
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("Falha ao escrever CSV: {}", e))
}
