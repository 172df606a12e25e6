// src/handlers/documents.rs

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{common::error::AppError, config::AppState};

// POST /parse_xml
// Aceita o XML no corpo da requisição ou no campo `file` de um multipart/form-data
pub async fn parse_xml(
    State(app_state): State<AppState>,
    request: Request,
) -> Result<impl IntoResponse, AppError> {
    if request.method() != Method::POST {
        return Err(AppError::InvalidRequest("Method Not Allowed".into()));
    }

    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let raw = if is_multipart {
        read_file_field(request).await?
    } else {
        Bytes::from_request(request, &())
            .await
            .map_err(|e| AppError::InvalidRequest(e.body_text()))?
    };

    let xml = String::from_utf8(raw.to_vec())
        .map_err(|_| AppError::InvalidRequest("Body is not valid UTF-8".into()))?;

    if xml.trim().is_empty() {
        return Err(AppError::InvalidRequest("Empty body".into()));
    }

    let parsed = app_state.document_service.parse(&xml)?;

    tracing::info!(tipo = ?parsed.parsed.tipo, chave = %parsed.parsed.chave, "XML processado");
    Ok((StatusCode::OK, Json(parsed)))
}

async fn read_file_field(request: Request) -> Result<Bytes, AppError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(e.body_text()))?
    {
        // Campo de texto com o mesmo nome não conta como arquivo
        if field.name() == Some("file") && field.file_name().is_some() {
            return field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidRequest(e.body_text()));
        }
    }

    Err(AppError::InvalidRequest("File not found".into()))
}
