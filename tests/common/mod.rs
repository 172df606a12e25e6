#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::{Map, Value};
use tower::ServiceExt;
use uuid::Uuid;

use docflow_functions::{
    common::error::AppError,
    config::{AppConfig, AppState},
    db::{AutomationStore, ReportStore, SharedLinkStore},
    models::{
        automation::{AutomationRule, NewDelivery, QueueEntry, QueueStatus},
        reports::{NewReportRun, ScheduledReport},
        shared_links::SharedLinkWithDocument,
    },
    router,
    storage::BlobStorage,
};

// ---------------------------------------------------------------------------
// Link store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeSharedLinkStore {
    pub links: Vec<SharedLinkWithDocument>,
}

#[async_trait]
impl SharedLinkStore for FakeSharedLinkStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<SharedLinkWithDocument>, AppError> {
        Ok(self.links.iter().find(|l| l.link.token == token).cloned())
    }
}

// ---------------------------------------------------------------------------
// Blob storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub bucket: String,
    pub path: String,
    pub content: String,
    pub content_type: String,
}

#[derive(Default)]
pub struct FakeBlobStorage {
    pub uploads: Mutex<Vec<Upload>>,
    pub signed: Mutex<Vec<(String, String, u64)>>,
    pub fail_uploads: bool,
}

#[async_trait]
impl BlobStorage for FakeBlobStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        if self.fail_uploads {
            return Err(AppError::StorageError("Bucket not found".into()));
        }
        self.uploads.lock().unwrap().push(Upload {
            bucket: bucket.to_string(),
            path: path.to_string(),
            content: String::from_utf8(bytes).unwrap(),
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_secs: u64,
    ) -> Result<String, AppError> {
        self.signed
            .lock()
            .unwrap()
            .push((bucket.to_string(), path.to_string(), ttl_secs));
        Ok(format!("https://storage.test/{}/{}?token=signed", bucket, path))
    }
}

// ---------------------------------------------------------------------------
// Automation store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeAutomationStore {
    pub entries: Mutex<Vec<QueueEntry>>,
    pub rules: Vec<AutomationRule>,
    pub webhooks: Mutex<Vec<(Uuid, Uuid, Value)>>,
    pub deliveries: Mutex<Vec<NewDelivery>>,
    // Empresas cuja busca de regras falha
    pub failing_companies: HashSet<Uuid>,
    // Itens que outro runner reivindica primeiro
    pub claimed_elsewhere: HashSet<Uuid>,
    pub fail_fetch: bool,
}

impl FakeAutomationStore {
    pub fn entry(&self, id: Uuid) -> QueueEntry {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl AutomationStore for FakeAutomationStore {
    async fn fetch_pending(&self, limit: i64) -> Result<Vec<QueueEntry>, AppError> {
        if self.fail_fetch {
            return Err(AppError::InternalServerError(anyhow::anyhow!("connection refused")));
        }
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.status == QueueStatus::Pending)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn claim(&self, entry_id: Uuid) -> Result<bool, AppError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.iter_mut().find(|e| e.id == entry_id).unwrap();
        if self.claimed_elsewhere.contains(&entry_id) {
            entry.status = QueueStatus::Processing;
            return Ok(false);
        }
        if entry.status != QueueStatus::Pending {
            return Ok(false);
        }
        entry.status = QueueStatus::Processing;
        Ok(true)
    }

    async fn find_active_rules(
        &self,
        company_id: Uuid,
        trigger_type: &str,
    ) -> Result<Vec<AutomationRule>, AppError> {
        if self.failing_companies.contains(&company_id) {
            return Err(AppError::InternalServerError(anyhow::anyhow!("rules lookup timed out")));
        }
        Ok(self
            .rules
            .iter()
            .filter(|r| r.company_id == company_id && r.trigger_type == trigger_type && r.ativo)
            .cloned()
            .collect())
    }

    async fn enqueue_webhook(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
        payload: &Value,
    ) -> Result<(), AppError> {
        self.webhooks
            .lock()
            .unwrap()
            .push((company_id, rule_id, payload.clone()));
        Ok(())
    }

    async fn create_delivery(&self, delivery: NewDelivery) -> Result<(), AppError> {
        self.deliveries.lock().unwrap().push(delivery);
        Ok(())
    }

    async fn mark_completed(&self, entry_id: Uuid, processed_at: DateTime<Utc>) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.iter_mut().find(|e| e.id == entry_id).unwrap();
        entry.status = QueueStatus::Completed;
        entry.processed_at = Some(processed_at);
        Ok(())
    }

    async fn mark_failed(&self, entry_id: Uuid, error_log: &str) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.iter_mut().find(|e| e.id == entry_id).unwrap();
        entry.status = QueueStatus::Error;
        entry.error_log = Some(error_log.to_string());
        Ok(())
    }
}

pub fn pending_entry(company_id: Uuid, event_type: &str, payload: Value) -> QueueEntry {
    QueueEntry {
        id: Uuid::new_v4(),
        company_id,
        event_type: event_type.to_string(),
        payload,
        status: QueueStatus::Pending,
        error_log: None,
        processed_at: None,
        created_at: Utc::now(),
    }
}

pub fn rule(company_id: Uuid, trigger_type: &str, filters: Option<Value>, action_type: &str) -> AutomationRule {
    AutomationRule {
        id: Uuid::new_v4(),
        company_id,
        trigger_type: trigger_type.to_string(),
        trigger_filters: filters,
        action_type: action_type.to_string(),
        action_config: None,
        ativo: true,
    }
}

// ---------------------------------------------------------------------------
// Report store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeReportStore {
    pub reports: Mutex<Vec<ScheduledReport>>,
    pub documents: Vec<Map<String, Value>>,
    pub runs: Mutex<Vec<NewReportRun>>,
    pub export_limits: Mutex<Vec<i64>>,
    pub fail_find: bool,
}

impl FakeReportStore {
    pub fn report(&self, id: Uuid) -> ScheduledReport {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl ReportStore for FakeReportStore {
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledReport>, AppError> {
        if self.fail_find {
            return Err(AppError::InternalServerError(anyhow::anyhow!("connection refused")));
        }
        Ok(self
            .reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.ativo && r.next_run_at <= now)
            .cloned()
            .collect())
    }

    async fn export_documents(
        &self,
        company_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Map<String, Value>>, AppError> {
        self.export_limits.lock().unwrap().push(limit);
        Ok(self
            .documents
            .iter()
            .filter(|d| d.get("company_id").and_then(Value::as_str) == Some(&company_id.to_string()))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn log_run(&self, run: &NewReportRun) -> Result<(), AppError> {
        self.runs.lock().unwrap().push(run.clone());
        Ok(())
    }

    async fn reschedule(&self, report_id: Uuid, next_run_at: DateTime<Utc>) -> Result<(), AppError> {
        let mut reports = self.reports.lock().unwrap();
        let report = reports.iter_mut().find(|r| r.id == report_id).unwrap();
        report.next_run_at = next_run_at;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App / HTTP helpers
// ---------------------------------------------------------------------------

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/test".to_string(),
        supabase_url: "https://storage.test".to_string(),
        service_role_key: "service-role".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        documents_bucket: "documents".to_string(),
        reports_bucket: "reports".to_string(),
        max_upload_bytes: 1024 * 1024,
        automation_interval: None,
        report_interval: None,
    }
}

pub struct TestStores {
    pub links: Arc<FakeSharedLinkStore>,
    pub automations: Arc<FakeAutomationStore>,
    pub reports: Arc<FakeReportStore>,
    pub storage: Arc<FakeBlobStorage>,
}

impl Default for TestStores {
    fn default() -> Self {
        Self {
            links: Arc::new(FakeSharedLinkStore::default()),
            automations: Arc::new(FakeAutomationStore::default()),
            reports: Arc::new(FakeReportStore::default()),
            storage: Arc::new(FakeBlobStorage::default()),
        }
    }
}

impl TestStores {
    pub fn state(&self) -> AppState {
        AppState::with_stores(
            test_config(),
            self.links.clone(),
            self.automations.clone(),
            self.reports.clone(),
            self.storage.clone(),
        )
    }

    pub fn app(&self) -> Router {
        router::app(self.state())
    }
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
