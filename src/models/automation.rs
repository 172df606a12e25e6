// src/models/automation.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

// Ciclo de vida de um item da fila: pending -> processing -> {completed, error}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "queue_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QueueEntry {
    pub id: Uuid,
    pub company_id: Uuid,
    pub event_type: String,
    pub payload: Value,
    pub status: QueueStatus,
    pub error_log: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AutomationRule {
    pub id: Uuid,
    pub company_id: Uuid,
    pub trigger_type: String,
    // Mapa plano chave -> valor; NULL ou {} casa com qualquer payload
    pub trigger_filters: Option<Value>,
    pub action_type: String,
    pub action_config: Option<Value>,
    pub ativo: bool,
}

/// Ação disparada quando uma regra casa com o evento.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationAction {
    /// Enfileira o payload em `webhooks_outbox`.
    Webhook,
    /// Cria uma entrega para o documento do evento.
    CriarEntrega,
    /// Tipo desconhecido: é registrado no log e ignorado.
    Unsupported(String),
}

impl From<&str> for AutomationAction {
    fn from(action_type: &str) -> Self {
        match action_type {
            "webhook" => AutomationAction::Webhook,
            "criar_entrega" => AutomationAction::CriarEntrega,
            other => AutomationAction::Unsupported(other.to_string()),
        }
    }
}

impl AutomationRule {
    pub fn action(&self) -> AutomationAction {
        AutomationAction::from(self.action_type.as_str())
    }

    /// `action_config.auto_assign`, falso quando ausente.
    pub fn auto_assign(&self) -> bool {
        self.action_config
            .as_ref()
            .and_then(|c| c.get("auto_assign"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

// Linha nova em `deliveries`, gerada pela ação `criar_entrega`
#[derive(Debug, Clone, PartialEq)]
pub struct NewDelivery {
    pub company_id: Uuid,
    pub document_id: Uuid,
    pub rule_id: Uuid,
    pub queue_entry_id: Uuid,
}

// --- Resposta do runner ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryOutcome {
    pub id: Uuid,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntryOutcome {
    pub fn ok(id: Uuid) -> Self {
        Self { id, status: OutcomeStatus::Ok, error: None }
    }

    pub fn failed(id: Uuid, error: String) -> Self {
        Self { id, status: OutcomeStatus::Error, error: Some(error) }
    }
}

#[derive(Debug, Serialize)]
pub struct AutomationRunSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub processed: Vec<EntryOutcome>,
}
