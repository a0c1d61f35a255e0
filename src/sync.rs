// Firestore Sync - Sync Pass Executor
//
// One pass = one snapshot read + one write per expected variable, strictly in
// list order. Per-variable failures are recorded as outcomes; only a failed
// snapshot read ends the pass early.

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::firestore::{FirestoreSink, RecordSink};
use crate::record::{coerce_to_number, Record};
use crate::snapshot::{RealtimeDbSource, Snapshot, SnapshotSource};
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Reason code recorded when a variable has no value in the snapshot.
pub const REASON_MISSING: &str = "missing";

// ============================================================================
// OUTCOME
// ============================================================================

/// Result of syncing one variable.
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeKind {
    /// Record persisted with this (coerced) value
    Synced { value: f64 },
    /// No value in the snapshot; no write attempted
    Missing,
    /// Destination store rejected or failed the write
    Failed { error: String },
}

/// Per-variable result of one sync pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub variable: String,
    pub kind: OutcomeKind,
}

impl Outcome {
    pub fn synced(variable: impl Into<String>, value: f64) -> Self {
        Self {
            variable: variable.into(),
            kind: OutcomeKind::Synced { value },
        }
    }

    pub fn missing(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            kind: OutcomeKind::Missing,
        }
    }

    pub fn failed(variable: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            kind: OutcomeKind::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.kind, OutcomeKind::Synced { .. })
    }

    pub fn value(&self) -> Option<f64> {
        match self.kind {
            OutcomeKind::Synced { value } => Some(value),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self.kind {
            OutcomeKind::Missing => Some(REASON_MISSING),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.kind {
            OutcomeKind::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Flat wire form: `{variable, success, value?, reason?, error?}`.
#[derive(serde::Serialize)]
struct OutcomeWire<'a> {
    variable: &'a str,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        OutcomeWire {
            variable: &self.variable,
            success: self.is_success(),
            value: self.value(),
            reason: self.reason(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

// ============================================================================
// SYNC REPORT
// ============================================================================

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    /// Every variable was attempted (some may have failed)
    Completed,
    /// Source answered with nothing to sync
    NoData,
    /// Snapshot could not be read; nothing attempted
    FetchFailed,
}

/// Aggregate result of one sync pass.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub pass_id: Uuid,
    pub status: PassStatus,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub success_count: usize,
    pub total: usize,
    #[serde(rename = "results")]
    pub outcomes: Vec<Outcome>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_data: Option<Value>,
}

impl SyncReport {
    fn fetch_failed(pass_id: Uuid, total: usize, err: &SyncError, started: Instant) -> Self {
        Self {
            pass_id,
            status: PassStatus::FetchFailed,
            success: false,
            message: "Sync failed".to_string(),
            error: Some(err.to_string()),
            success_count: 0,
            total,
            outcomes: Vec::new(),
            duration_ms: elapsed_ms(started),
            timestamp: Utc::now(),
            source_data: None,
        }
    }

    fn no_data(pass_id: Uuid, total: usize, started: Instant) -> Self {
        Self {
            pass_id,
            status: PassStatus::NoData,
            success: false,
            message: "no data found".to_string(),
            error: None,
            success_count: 0,
            total,
            outcomes: Vec::new(),
            duration_ms: elapsed_ms(started),
            timestamp: Utc::now(),
            source_data: None,
        }
    }

    fn completed(
        pass_id: Uuid,
        outcomes: Vec<Outcome>,
        total: usize,
        snapshot: &Snapshot,
        started: Instant,
    ) -> Self {
        let success_count = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            pass_id,
            status: PassStatus::Completed,
            success: true,
            message: format!("Synced {success_count}/{total} variables"),
            error: None,
            success_count,
            total,
            outcomes,
            duration_ms: elapsed_ms(started),
            timestamp: Utc::now(),
            source_data: Some(snapshot.to_json()),
        }
    }

    /// Outcome for a given variable, if it was part of the pass.
    pub fn outcome(&self, variable: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.variable == variable)
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// EXECUTOR
// ============================================================================

/// Runs sync passes over a fixed, ordered list of variables.
///
/// Holds no mutable state, so one executor can serve concurrent triggers.
pub struct SyncExecutor {
    source: Arc<dyn SnapshotSource>,
    sink: Arc<dyn RecordSink>,
    variables: Vec<String>,
}

impl SyncExecutor {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        sink: Arc<dyn RecordSink>,
        variables: Vec<String>,
    ) -> Self {
        Self {
            source,
            sink,
            variables,
        }
    }

    /// Wire the Realtime Database source and Firestore sink from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let api_key = config.resolve_api_key()?;

        let source = RealtimeDbSource::new(&config.source)?;
        let sink = FirestoreSink::new(&config.destination, api_key)?;

        Ok(Self::new(
            Arc::new(source),
            Arc::new(sink),
            config.variables.clone(),
        ))
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Run one full pass. Never fails: every error ends up in the report.
    pub async fn run_sync_pass(&self) -> SyncReport {
        let started = Instant::now();
        let pass_id = Uuid::new_v4();
        let total = self.variables.len();
        info!(%pass_id, variables = total, "Starting data sync process");

        let snapshot = match self.source.fetch_snapshot().await {
            Ok(Some(snapshot)) if !snapshot.is_empty() => snapshot,
            Ok(_) => {
                warn!(%pass_id, "No data found in Realtime Database");
                return SyncReport::no_data(pass_id, total, started);
            }
            Err(err) => {
                error!(%pass_id, error = %err, "Sync failed");
                return SyncReport::fetch_failed(pass_id, total, &err, started);
            }
        };
        debug!(%pass_id, keys = snapshot.len(), "Retrieved snapshot");

        let mut outcomes = Vec::with_capacity(total);
        for variable in &self.variables {
            outcomes.push(self.sync_variable(variable, &snapshot).await);
        }

        let report = SyncReport::completed(pass_id, outcomes, total, &snapshot, started);
        info!(
            %pass_id,
            synced = report.success_count,
            total,
            duration_ms = report.duration_ms,
            "Sync process completed"
        );
        report
    }

    async fn sync_variable(&self, variable: &str, snapshot: &Snapshot) -> Outcome {
        let Some(raw) = snapshot.get(variable) else {
            warn!(variable, "Value is undefined or null");
            return Outcome::missing(variable);
        };

        let value = coerce_to_number(raw);
        let record = Record::new(variable, value);
        match self.sink.persist_record(&record).await {
            Ok(()) => {
                debug!(variable, value, "Saved to Firestore");
                Outcome::synced(variable, value)
            }
            Err(err) => {
                error!(variable, error = %err, "Error saving to Firestore");
                Outcome::failed(variable, err.to_string())
            }
        }
    }
}
