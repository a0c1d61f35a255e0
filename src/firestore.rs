// Firestore Sync - Record Sink
//
// One POST per record into the collection named after the variable. Every
// write is an unconditional create: Firestore assigns the document id.

use crate::config::DestinationConfig;
use crate::error::{Result, SyncError};
use crate::record::Record;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Capability: persist one record in the destination store.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn persist_record(&self, record: &Record) -> Result<()>;
}

/// Firestore REST writer.
pub struct FirestoreSink {
    client: reqwest::Client,
    documents_url: String,
    api_key: String,
}

impl FirestoreSink {
    /// Create a sink for the configured project; `api_key` is resolved by the caller.
    pub fn new(config: &DestinationConfig, api_key: String) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            documents_url: documents_url(config),
            api_key,
        })
    }

    /// URL of the collection a variable's records are created in.
    pub fn collection_url(&self, variable: &str) -> String {
        format!(
            "{}/{}?key={}",
            self.documents_url,
            urlencoding::encode(variable),
            urlencoding::encode(&self.api_key)
        )
    }
}

fn documents_url(config: &DestinationConfig) -> String {
    format!(
        "{}/projects/{}/databases/{}/documents",
        config.base_url.trim_end_matches('/'),
        config.project_id,
        config.database_id
    )
}

#[async_trait]
impl RecordSink for FirestoreSink {
    async fn persist_record(&self, record: &Record) -> Result<()> {
        let response = self
            .client
            .post(self.collection_url(&record.variable))
            .json(&record.to_document())
            .send()
            .await
            .map_err(|e| SyncError::destination_write(&record.variable, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::destination_write(
                &record.variable,
                format!("Firestore API error: {} - {}", status.as_u16(), body),
            ));
        }

        let created: Option<Value> = response.json().await.ok();
        let name = created
            .as_ref()
            .and_then(|doc| doc.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>");
        debug!(variable = %record.variable, document = name, "Created Firestore document");

        Ok(())
    }
}
