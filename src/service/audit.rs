use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::mpsc::{SyncSender, TrySendError, sync_channel};
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TriageError;
use crate::model::labels::Label;
use crate::model::scores::ScoreVector;

/// One append-only audit trail entry, written per classification for later
/// retraining and recalibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sample_id: String,
    pub scores: ScoreVector,
    pub label: Label,
    pub confidence: f64,
    pub policy_version: String,
    pub unix_time_secs: u64,
}

impl AuditRecord {
    pub fn stamped(
        sample_id: &str,
        scores: ScoreVector,
        label: Label,
        confidence: f64,
        policy_version: &str,
    ) -> Self {
        let unix_time_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            sample_id: sample_id.to_string(),
            scores,
            label,
            confidence,
            policy_version: policy_version.to_string(),
            unix_time_secs,
        }
    }
}

/// Destination for audit records. Implementations must be safe to call from
/// concurrent classification requests.
pub trait AuditSink: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<(), TriageError>;
}

/// Discards records. For deployments that wire the audit trail elsewhere.
#[derive(Debug, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn append(&self, _record: &AuditRecord) -> Result<(), TriageError> {
        Ok(())
    }
}

/// Appends records as JSON lines to a local file.
pub struct JsonlAuditSink {
    file: Mutex<std::fs::File>,
    path: String,
}

impl JsonlAuditSink {
    pub fn open(path: &Path) -> Result<Self, TriageError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            path: path.display().to_string(),
        })
    }
}

impl AuditSink for JsonlAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), TriageError> {
        let line = serde_json::to_string(record)
            .map_err(|e| TriageError::AuditWrite(e.to_string()))?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| TriageError::AuditWrite(format!("{}: writer poisoned", self.path)))?;
        writeln!(file, "{}", line)
            .map_err(|e| TriageError::AuditWrite(format!("{}: {}", self.path, e)))?;
        Ok(())
    }
}

/// Bounded hand-off to a writer thread. `append` never blocks the
/// classification response: when the queue is full the record is dropped
/// and the failure surfaced to the caller as an `AuditWrite` error, which
/// the service downgrades to a warning.
pub struct ChannelAuditSink {
    tx: Option<SyncSender<AuditRecord>>,
    worker: Option<JoinHandle<()>>,
}

impl ChannelAuditSink {
    pub fn spawn(inner: Box<dyn AuditSink>, capacity: usize) -> Self {
        let (tx, rx) = sync_channel::<AuditRecord>(capacity);
        let worker = std::thread::spawn(move || {
            for record in rx {
                if let Err(err) = inner.append(&record) {
                    warn!("audit writer thread: {}", err);
                }
            }
        });
        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }
}

impl AuditSink for ChannelAuditSink {
    fn append(&self, record: &AuditRecord) -> Result<(), TriageError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| TriageError::AuditWrite("audit channel closed".to_string()))?;
        match tx.try_send(record.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(TriageError::AuditWrite(
                "audit queue full; record dropped".to_string(),
            )),
            Err(TrySendError::Disconnected(_)) => Err(TriageError::AuditWrite(
                "audit writer thread gone; record dropped".to_string(),
            )),
        }
    }
}

impl Drop for ChannelAuditSink {
    fn drop(&mut self) {
        // Close the channel so the writer drains and exits.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
