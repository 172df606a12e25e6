// src/db/shared_link_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        documents::Document,
        shared_links::{LinkPermissions, SharedLink, SharedLinkWithDocument},
    },
};

#[async_trait]
pub trait SharedLinkStore: Send + Sync {
    /// Busca o link pelo token, já com o documento associado.
    async fn find_by_token(&self, token: &str) -> Result<Option<SharedLinkWithDocument>, AppError>;
}

#[derive(Clone)]
pub struct SharedLinkRepository {
    pool: PgPool,
}

impl SharedLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Linha "achatada" do join shared_links x documents
#[derive(FromRow)]
struct SharedLinkRow {
    token: String,
    permissions: Option<Json<LinkPermissions>>,
    revoked_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    document_id: Uuid,
    company_id: Uuid,
    numero: Option<String>,
    serie: Option<String>,
    emissao_data: Option<NaiveDate>,
    valor_total: Option<Decimal>,
    status: Option<String>,
    pdf_url: Option<String>,
}

impl From<SharedLinkRow> for SharedLinkWithDocument {
    fn from(row: SharedLinkRow) -> Self {
        Self {
            link: SharedLink {
                token: row.token,
                document_id: row.document_id,
                permissions: row.permissions.map(|p| p.0).unwrap_or_default(),
                revoked_at: row.revoked_at,
                expires_at: row.expires_at,
            },
            document: Document {
                id: row.document_id,
                company_id: row.company_id,
                numero: row.numero,
                serie: row.serie,
                emissao_data: row.emissao_data,
                valor_total: row.valor_total,
                status: row.status,
                pdf_url: row.pdf_url,
            },
        }
    }
}

#[async_trait]
impl SharedLinkStore for SharedLinkRepository {
    async fn find_by_token(&self, token: &str) -> Result<Option<SharedLinkWithDocument>, AppError> {
        let row = sqlx::query_as::<_, SharedLinkRow>(
            r#"
            SELECT
                l.token, l.permissions, l.revoked_at, l.expires_at,
                d.id AS document_id, d.company_id,
                d.numero, d.serie, d.emissao_data, d.valor_total, d.status, d.pdf_url
            FROM shared_links l
            JOIN documents d ON d.id = l.document_id
            WHERE l.token = $1
            "#,
        )
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(SharedLinkWithDocument::from))
    }
}
