// src/background.rs

//! Disparo periódico do runner de automações e dos relatórios dentro do
//! próprio processo, para quando não há cron externo chamando as rotas.

use std::{future::Future, time::Duration};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::AppState;

pub fn spawn_tickers(app_state: &AppState, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    if let Some(every) = app_state.config.automation_interval {
        let service = app_state.automation_service.clone();
        handles.push(tokio::spawn(run_every("automations", every, cancel.clone(), move || {
            let service = service.clone();
            async move {
                match service.run_batch(Utc::now()).await {
                    Ok(outcomes) if !outcomes.is_empty() => {
                        tracing::info!(processed = outcomes.len(), "Lote de automações processado")
                    }
                    Ok(_) => tracing::debug!("Nenhum evento pendente"),
                    Err(e) => tracing::error!(error = %e, "Falha ao buscar eventos pendentes"),
                }
            }
        })));
    }

    if let Some(every) = app_state.config.report_interval {
        let service = app_state.report_service.clone();
        handles.push(tokio::spawn(run_every("reports", every, cancel, move || {
            let service = service.clone();
            async move {
                match service.run_due(Utc::now()).await {
                    Ok(processed) => tracing::info!(processed, "Relatórios agendados verificados"),
                    Err(e) => tracing::error!(error = %e, "Falha ao buscar relatórios vencidos"),
                }
            }
        })));
    }

    handles
}

async fn run_every<F, Fut>(name: &'static str, every: Duration, cancel: CancellationToken, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    tracing::info!(job = name, interval_secs = every.as_secs(), "Job periódico iniciado");
    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(job = name, "Job periódico encerrando");
                break;
            }
            _ = interval.tick() => tick().await,
        }
    }
}
