// src/models/shared_links.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::models::documents::Document;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkPermissions {
    // Qualquer valor "verdadeiro" libera o download; null, "" e 0 não
    #[serde(default, deserialize_with = "truthy")]
    pub download: bool,
    // Outras permissões são devolvidas ao viewer sem interpretação
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0 && !x.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

#[derive(Debug, Clone)]
pub struct SharedLink {
    pub token: String,
    pub document_id: uuid::Uuid,
    pub permissions: LinkPermissions,
    pub revoked_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

// Link junto com o documento apontado (equivalente ao select com join)
#[derive(Debug, Clone)]
pub struct SharedLinkWithDocument {
    pub link: SharedLink,
    pub document: Document,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SharedLinkQuery {
    #[validate(required, length(min = 1))]
    pub token: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SharedDocumentInfo {
    pub numero: Option<String>,
    pub serie: Option<String>,
    pub data: Option<NaiveDate>,
    pub valor: Option<Decimal>,
    pub status: Option<String>,
}

/// Projeção pública mostrada no viewer.
#[derive(Debug, Serialize)]
pub struct SharedDocumentView {
    pub document: SharedDocumentInfo,
    pub permissions: LinkPermissions,
}

impl From<SharedLinkWithDocument> for SharedDocumentView {
    fn from(found: SharedLinkWithDocument) -> Self {
        let doc = found.document;
        Self {
            document: SharedDocumentInfo {
                numero: doc.numero,
                serie: doc.serie,
                data: doc.emissao_data,
                valor: doc.valor_total,
                status: doc.status,
            },
            permissions: found.link.permissions,
        }
    }
}
