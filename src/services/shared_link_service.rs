// src/services/shared_link_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    common::error::AppError,
    db::SharedLinkStore,
    models::shared_links::{SharedDocumentView, SharedLinkWithDocument},
    storage::BlobStorage,
};

// Validade da URL assinada do PDF
pub const SIGNED_URL_TTL_SECS: u64 = 60;

/// O que o visitante pediu ao abrir o link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Metadata,
    Download,
}

impl LinkAction {
    pub fn from_param(action: Option<&str>) -> Self {
        match action {
            Some("download") => LinkAction::Download,
            _ => LinkAction::Metadata,
        }
    }
}

#[derive(Debug)]
pub enum LinkResolution {
    Metadata(SharedDocumentView),
    Redirect(String),
}

#[derive(Clone)]
pub struct SharedLinkService {
    links: Arc<dyn SharedLinkStore>,
    storage: Arc<dyn BlobStorage>,
    documents_bucket: String,
}

impl SharedLinkService {
    pub fn new(
        links: Arc<dyn SharedLinkStore>,
        storage: Arc<dyn BlobStorage>,
        documents_bucket: String,
    ) -> Self {
        Self { links, storage, documents_bucket }
    }

    pub async fn resolve(
        &self,
        token: &str,
        action: LinkAction,
        now: DateTime<Utc>,
    ) -> Result<LinkResolution, AppError> {
        let found = self
            .links
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid or expired link".into()))?;

        check_lifecycle(&found, now)?;

        match action {
            LinkAction::Metadata => Ok(LinkResolution::Metadata(found.into())),
            LinkAction::Download => {
                if !found.link.permissions.download {
                    return Err(AppError::Forbidden("Download permission denied".into()));
                }

                let pdf_path = found
                    .document
                    .pdf_url
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| AppError::NotFound("Document has no PDF".into()))?;

                let url = self
                    .storage
                    .create_signed_url(&self.documents_bucket, pdf_path, SIGNED_URL_TTL_SECS)
                    .await?;

                tracing::info!(document_id = %found.document.id, "URL assinada emitida para link público");
                Ok(LinkResolution::Redirect(url))
            }
        }
    }
}

// Expirado tem precedência sobre revogado: um link vencido responde 410 mesmo se revogado
fn check_lifecycle(found: &SharedLinkWithDocument, now: DateTime<Utc>) -> Result<(), AppError> {
    if found.link.expires_at.is_some_and(|expires_at| expires_at < now) {
        return Err(AppError::Gone("Link expired".into()));
    }
    if found.link.revoked_at.is_some() {
        return Err(AppError::Forbidden("Link revoked".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_download_param_selects_download() {
        assert_eq!(LinkAction::from_param(Some("download")), LinkAction::Download);
        assert_eq!(LinkAction::from_param(Some("view")), LinkAction::Metadata);
        assert_eq!(LinkAction::from_param(None), LinkAction::Metadata);
    }
}
