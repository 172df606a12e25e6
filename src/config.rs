// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        AutomationRepository, AutomationStore, ReportRepository, ReportStore,
        SharedLinkRepository, SharedLinkStore,
    },
    services::{
        automation_service::AutomationService, document_service::DocumentService,
        report_service::ReportService, shared_link_service::SharedLinkService,
    },
    storage::{BlobStorage, SupabaseStorage},
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub supabase_url: String,
    // Service role: ignora as políticas RLS. Nunca logar.
    pub service_role_key: String,
    pub bind_addr: String,
    pub documents_bucket: String,
    pub reports_bucket: String,
    pub max_upload_bytes: usize,
    pub automation_interval: Option<Duration>,
    pub report_interval: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            supabase_url: required("SUPABASE_URL")?,
            service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            documents_bucket: env::var("DOCUMENTS_BUCKET").unwrap_or_else(|_| "documents".to_string()),
            reports_bucket: env::var("REPORTS_BUCKET").unwrap_or_else(|_| "reports".to_string()),
            max_upload_bytes: optional_parse("MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            automation_interval: interval_secs("AUTOMATION_INTERVAL_SECS", env::var("AUTOMATION_INTERVAL_SECS").ok())?,
            report_interval: interval_secs("REPORT_INTERVAL_SECS", env::var("REPORT_INTERVAL_SECS").ok())?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{} deve ser definida", key))
}

fn optional_parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key).ok().map(|raw| parse_value(key, &raw)).transpose()
}

fn parse_value<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{} inválida: {}", key, raw))
}

// Intervalo dos jobs periódicos: ausente desliga o job, zero é rejeitado
fn interval_secs(key: &str, raw: Option<String>) -> anyhow::Result<Option<Duration>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let secs: u64 = parse_value(key, &raw)?;
    if secs == 0 {
        anyhow::bail!("{} deve ser maior que zero", key);
    }
    Ok(Some(Duration::from_secs(secs)))
}

pub async fn connect_database(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .context("Falha ao conectar ao banco de dados")?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(db_pool)
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub document_service: DocumentService,
    pub shared_link_service: SharedLinkService,
    pub automation_service: AutomationService,
    pub report_service: ReportService,
}

impl AppState {
    // --- Monta o gráfico de dependências com Postgres + Supabase Storage ---
    pub fn new(config: AppConfig, db_pool: PgPool) -> Self {
        let storage = Arc::new(SupabaseStorage::new(&config.supabase_url, &config.service_role_key));

        Self::with_stores(
            config,
            Arc::new(SharedLinkRepository::new(db_pool.clone())),
            Arc::new(AutomationRepository::new(db_pool.clone())),
            Arc::new(ReportRepository::new(db_pool)),
            storage,
        )
    }

    pub fn with_stores(
        config: AppConfig,
        links: Arc<dyn SharedLinkStore>,
        automations: Arc<dyn AutomationStore>,
        reports: Arc<dyn ReportStore>,
        storage: Arc<dyn BlobStorage>,
    ) -> Self {
        Self {
            document_service: DocumentService::new(),
            shared_link_service: SharedLinkService::new(
                links,
                storage.clone(),
                config.documents_bucket.clone(),
            ),
            automation_service: AutomationService::new(automations),
            report_service: ReportService::new(reports, storage, config.reports_bucket.clone()),
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_optional() {
        assert_eq!(interval_secs("REPORT_INTERVAL_SECS", None).unwrap(), None);
        assert_eq!(
            interval_secs("REPORT_INTERVAL_SECS", Some(" 60 ".into())).unwrap(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = interval_secs("AUTOMATION_INTERVAL_SECS", Some("0".into())).unwrap_err();
        assert!(err.to_string().contains("AUTOMATION_INTERVAL_SECS"));
    }

    #[test]
    fn non_numeric_interval_is_rejected() {
        assert!(interval_secs("AUTOMATION_INTERVAL_SECS", Some("5m".into())).is_err());
        assert!(interval_secs("AUTOMATION_INTERVAL_SECS", Some("-1".into())).is_err());
    }
}
