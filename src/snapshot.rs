// Firestore Sync - Snapshot Source
//
// Reads the whole Realtime Database tree in one GET. The snapshot is read
// once per pass and dropped when the pass ends.

use crate::config::SourceConfig;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Point-in-time view of the source tree.
///
/// Variables are looked up as keys of an object root. Any other truthy root
/// is kept as-is and simply has no variables in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    root: Value,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(Map::new())
    }
}

impl Snapshot {
    pub fn new(values: Map<String, Value>) -> Self {
        Self {
            root: Value::Object(values),
        }
    }

    /// Interpret a decoded response body.
    ///
    /// Falsy roots (`null`, `false`, `0`, `""`) yield `None`: nothing stored.
    pub fn from_json(body: Value) -> Option<Self> {
        if is_falsy(&body) {
            return None;
        }
        Some(Self { root: body })
    }

    /// Value for `variable`; JSON null counts as absent.
    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.root
            .as_object()
            .and_then(|values| values.get(variable))
            .filter(|value| !value.is_null())
    }

    /// True only for an object root without keys.
    pub fn is_empty(&self) -> bool {
        self.root.as_object().is_some_and(Map::is_empty)
    }

    /// Number of keys in an object root; 0 for any other root.
    pub fn len(&self) -> usize {
        self.root.as_object().map_or(0, Map::len)
    }

    /// Raw snapshot as JSON, echoed back in the report.
    pub fn to_json(&self) -> Value {
        self.root.clone()
    }
}

impl From<Map<String, Value>> for Snapshot {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Capability: read the current snapshot from the source store.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// `Ok(None)` means the store answered but holds no data.
    async fn fetch_snapshot(&self) -> Result<Option<Snapshot>>;
}

/// Realtime Database REST reader (`GET {database_url}/.json`).
pub struct RealtimeDbSource {
    client: reqwest::Client,
    snapshot_url: String,
}

impl RealtimeDbSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            snapshot_url: snapshot_url(&config.database_url),
        })
    }

    pub fn snapshot_url(&self) -> &str {
        &self.snapshot_url
    }
}

fn snapshot_url(database_url: &str) -> String {
    format!("{}/.json", database_url.trim_end_matches('/'))
}

#[async_trait]
impl SnapshotSource for RealtimeDbSource {
    async fn fetch_snapshot(&self) -> Result<Option<Snapshot>> {
        debug!(url = %self.snapshot_url, "Fetching data from Realtime Database");

        let response = self
            .client
            .get(&self.snapshot_url)
            .send()
            .await
            .map_err(|e| SyncError::source_fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::source_fetch(format!(
                "Realtime Database error: status {}",
                status.as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::source_fetch(format!("invalid JSON body: {e}")))?;

        Ok(Snapshot::from_json(body))
    }
}
