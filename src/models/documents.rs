// src/models/documents.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// Documento fiscal já ingerido (tabela `documents`)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: Uuid,
    pub company_id: Uuid,
    pub numero: Option<String>,
    pub serie: Option<String>,
    pub emissao_data: Option<NaiveDate>,
    pub valor_total: Option<Decimal>,
    pub status: Option<String>,
    // Caminho do PDF dentro do bucket de documentos
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipoDocumento {
    Nfe,
    Cte,
    Outros,
}

/// Resumo normalizado extraído de um XML de NF-e ou CT-e.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub tipo: TipoDocumento,
    pub chave: String,
    pub numero: String,
    pub serie: String,
    pub emitente: String,
    pub destinatario: String,
    pub valor: f64,
    pub data_emissao: Option<String>,
}

impl Default for DocumentSummary {
    fn default() -> Self {
        Self {
            tipo: TipoDocumento::Outros,
            chave: String::new(),
            numero: String::new(),
            serie: String::new(),
            emitente: String::new(),
            destinatario: String::new(),
            valor: 0.0,
            data_emissao: None,
        }
    }
}

// Resposta do parser: árvore completa + resumo
#[derive(Debug, Serialize)]
pub struct ParsedDocument {
    pub data: Value,
    pub parsed: DocumentSummary,
}
