// src/services/automation_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AutomationStore,
    models::automation::{AutomationAction, AutomationRule, EntryOutcome, NewDelivery, QueueEntry},
    services::rule_filter::Predicate,
};

// Itens da fila processados por invocação
pub const BATCH_SIZE: i64 = 10;

// Evento que habilita a ação `criar_entrega`
const DOCUMENT_CREATED_EVENT: &str = "documento_criado";

#[derive(Clone)]
pub struct AutomationService {
    store: Arc<dyn AutomationStore>,
}

impl AutomationService {
    pub fn new(store: Arc<dyn AutomationStore>) -> Self {
        Self { store }
    }

    /// Processa um lote de eventos pendentes.
    ///
    /// Só a busca inicial pode falhar a chamada inteira; erros de um item
    /// ficam gravados no próprio item e o lote continua.
    pub async fn run_batch(&self, now: DateTime<Utc>) -> Result<Vec<EntryOutcome>, AppError> {
        let entries = self.store.fetch_pending(BATCH_SIZE).await?;
        let mut outcomes = Vec::with_capacity(entries.len());

        for entry in entries {
            let result = match self.store.claim(entry.id).await {
                Ok(true) => self.process_entry(&entry, now).await,
                Ok(false) => {
                    tracing::debug!(entry_id = %entry.id, "Evento já reivindicado por outro runner");
                    continue;
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => outcomes.push(EntryOutcome::ok(entry.id)),
                Err(e) => {
                    let message = e.to_string();
                    tracing::warn!(entry_id = %entry.id, error = %message, "Falha ao processar evento da fila");

                    if let Err(mark_err) = self.store.mark_failed(entry.id, &message).await {
                        tracing::error!(entry_id = %entry.id, error = %mark_err, "Não foi possível marcar o evento como erro");
                    }
                    outcomes.push(EntryOutcome::failed(entry.id, message));
                }
            }
        }

        Ok(outcomes)
    }

    async fn process_entry(&self, entry: &QueueEntry, now: DateTime<Utc>) -> Result<(), AppError> {
        let rules = self
            .store
            .find_active_rules(entry.company_id, &entry.event_type)
            .await?;

        for rule in &rules {
            let predicate = Predicate::from_filters(rule.trigger_filters.as_ref());
            if predicate.matches(&entry.payload) {
                self.execute_action(rule, entry).await?;
            }
        }

        self.store.mark_completed(entry.id, now).await
    }

    async fn execute_action(&self, rule: &AutomationRule, entry: &QueueEntry) -> Result<(), AppError> {
        match rule.action() {
            AutomationAction::Webhook => {
                self.store
                    .enqueue_webhook(entry.company_id, rule.id, &entry.payload)
                    .await
            }
            AutomationAction::CriarEntrega => self.create_delivery(rule, entry).await,
            AutomationAction::Unsupported(kind) => {
                tracing::warn!(rule_id = %rule.id, action_type = %kind, "Tipo de ação desconhecido, ignorado");
                Ok(())
            }
        }
    }

    // Só age para `documento_criado` com `auto_assign`; o payload precisa de `document_id`
    async fn create_delivery(&self, rule: &AutomationRule, entry: &QueueEntry) -> Result<(), AppError> {
        if entry.event_type != DOCUMENT_CREATED_EVENT || !rule.auto_assign() {
            tracing::debug!(rule_id = %rule.id, "criar_entrega sem auto_assign para este evento");
            return Ok(());
        }

        let document_id = entry
            .payload
            .get("document_id")
            .and_then(|v| v.as_str())
            .and_then(|v| Uuid::parse_str(v).ok())
            .ok_or_else(|| AppError::InvalidRequest("payload sem document_id válido para criar_entrega".into()))?;

        self.store
            .create_delivery(NewDelivery {
                company_id: entry.company_id,
                document_id,
                rule_id: rule.id,
                queue_entry_id: entry.id,
            })
            .await
    }
}
