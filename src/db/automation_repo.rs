// src/db/automation_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::automation::{AutomationRule, NewDelivery, QueueEntry, QueueStatus},
};

#[async_trait]
pub trait AutomationStore: Send + Sync {
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<QueueEntry>, AppError>;

    /// Troca pending -> processing de forma atômica.
    /// Retorna `false` se outro runner já pegou o item.
    async fn claim(&self, entry_id: Uuid) -> Result<bool, AppError>;

    async fn find_active_rules(
        &self,
        company_id: Uuid,
        trigger_type: &str,
    ) -> Result<Vec<AutomationRule>, AppError>;

    async fn enqueue_webhook(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
        payload: &Value,
    ) -> Result<(), AppError>;

    async fn create_delivery(&self, delivery: NewDelivery) -> Result<(), AppError>;

    async fn mark_completed(&self, entry_id: Uuid, processed_at: DateTime<Utc>) -> Result<(), AppError>;

    async fn mark_failed(&self, entry_id: Uuid, error_log: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct AutomationRepository {
    pool: PgPool,
}

impl AutomationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AutomationStore for AutomationRepository {
    // =========================================================================
    //  FILA (automation_queue)
    // =========================================================================

    async fn fetch_pending(&self, limit: i64) -> Result<Vec<QueueEntry>, AppError> {
        let entries = sqlx::query_as::<_, QueueEntry>(
            r#"
            SELECT id, company_id, event_type, payload, status, error_log, processed_at, created_at
            FROM automation_queue
            WHERE status = $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
            .bind(QueueStatus::Pending)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn claim(&self, entry_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE automation_queue SET status = $1 WHERE id = $2 AND status = $3",
        )
            .bind(QueueStatus::Processing)
            .bind(entry_id)
            .bind(QueueStatus::Pending)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_completed(&self, entry_id: Uuid, processed_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE automation_queue SET status = $1, processed_at = $2 WHERE id = $3")
            .bind(QueueStatus::Completed)
            .bind(processed_at)
            .bind(entry_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_failed(&self, entry_id: Uuid, error_log: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE automation_queue SET status = $1, error_log = $2 WHERE id = $3")
            .bind(QueueStatus::Error)
            .bind(error_log)
            .bind(entry_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    //  REGRAS E AÇÕES
    // =========================================================================

    async fn find_active_rules(
        &self,
        company_id: Uuid,
        trigger_type: &str,
    ) -> Result<Vec<AutomationRule>, AppError> {
        let rules = sqlx::query_as::<_, AutomationRule>(
            r#"
            SELECT id, company_id, trigger_type, trigger_filters, action_type, action_config, ativo
            FROM automation_rules
            WHERE company_id = $1 AND trigger_type = $2 AND ativo = TRUE
            "#,
        )
            .bind(company_id)
            .bind(trigger_type)
            .fetch_all(&self.pool)
            .await?;

        Ok(rules)
    }

    async fn enqueue_webhook(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
        payload: &Value,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO webhooks_outbox (company_id, rule_id, payload_json) VALUES ($1, $2, $3)",
        )
            .bind(company_id)
            .bind(rule_id)
            .bind(payload)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_delivery(&self, delivery: NewDelivery) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO deliveries (company_id, document_id, rule_id, queue_entry_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
            .bind(delivery.company_id)
            .bind(delivery.document_id)
            .bind(delivery.rule_id)
            .bind(delivery.queue_entry_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
