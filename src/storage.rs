// src/storage.rs

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use serde::Deserialize;
use serde_json::json;

use crate::common::error::AppError;

/// Operações de blob usadas pelas funções: upload e URL assinada.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError>;

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_secs: u64,
    ) -> Result<String, AppError>;
}

// Cliente da API REST do Supabase Storage, autenticado com a service role
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    // Cada segmento do caminho é codificado: '?' e '#' fazem parte do nome do objeto
    fn object_url(&self, prefix: &str, bucket: &str, path: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::StorageError(format!("URL do storage inválida: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| AppError::StorageError("URL do storage não aceita caminho".into()))?
            .pop_if_empty()
            .extend(["storage", "v1"])
            .extend(prefix.split('/'))
            .push(bucket)
            .extend(path.split('/').filter(|segment| !segment.is_empty()));

        Ok(url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::StorageError(format!("{}: {}", status, body)))
    }
}

#[async_trait]
impl BlobStorage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        let response = self
            .client
            .post(self.object_url("object", bucket, path)?)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl_secs: u64,
    ) -> Result<String, AppError> {
        let response = self
            .client
            .post(self.object_url("object/sign", bucket, path)?)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&json!({ "expiresIn": ttl_secs }))
            .send()
            .await?;

        let signed: SignedUrlResponse = Self::check(response).await?.json().await?;

        // A API devolve um caminho relativo a /storage/v1
        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }
}
