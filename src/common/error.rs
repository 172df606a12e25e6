use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Taxonomia de erros compartilhada pelas quatro funções.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Parâmetros inválidos: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Gone(String),

    // Falha ao decodificar o XML recebido
    #[error("{0}")]
    ParseError(String),

    // --- Erros dos colaboradores (banco e storage) ---
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro de storage: {0}")]
    StorageError(String),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Gone(_) => StatusCode::GONE,
            AppError::ParseError(_)
            | AppError::DatabaseError(_)
            | AppError::StorageError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            // Erros de entrada e do ciclo de vida do link: texto puro
            AppError::InvalidRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::Gone(msg) => (status, msg).into_response(),

            AppError::ValidationError(errors) => {
                let field_errors = errors.field_errors();
                let mut fields: Vec<&str> = field_errors.keys().map(|f| f.as_ref()).collect();
                fields.sort_unstable();
                (status, format!("Missing or invalid: {}", fields.join(", "))).into_response()
            }

            // O parser devolve a mensagem original do erro
            AppError::ParseError(msg) => (status, Json(json!({ "error": msg }))).into_response(),

            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (status, Json(json!({ "error": e.to_string() }))).into_response()
            }
        }
    }
}
