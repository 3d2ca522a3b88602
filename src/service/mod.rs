use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::TriageError;
use crate::model::labels::Label;
use crate::model::policy::DecisionPolicyConfig;
use crate::model::scores::ScoreVector;
use crate::pipeline::decide::{adjusted_scores, decide, decision_confidence};

pub mod audit;

pub use audit::{AuditRecord, AuditSink, ChannelAuditSink, JsonlAuditSink, NullAuditSink};

/// Classification response returned to the presentation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub label: Label,
    /// Renormalized cost-weighted probability of the winning class, not the
    /// raw model score.
    pub confidence: f64,
    pub policy_version: String,
}

struct PolicyHandle {
    config: DecisionPolicyConfig,
    version: String,
}

/// Request-parallel classification front. Requests only read the shared,
/// immutable policy handle; a recalibrated config replaces it by atomic
/// pointer swap, so concurrent readers never observe a half-updated policy.
pub struct InferenceService {
    policy: RwLock<Option<Arc<PolicyHandle>>>,
    audit: Box<dyn AuditSink>,
}

impl InferenceService {
    /// A service with no policy installed; `classify` fails with
    /// `ServiceNotReady` until one is.
    pub fn new(audit: Box<dyn AuditSink>) -> Self {
        Self {
            policy: RwLock::new(None),
            audit,
        }
    }

    pub fn with_policy(
        config: DecisionPolicyConfig,
        audit: Box<dyn AuditSink>,
    ) -> Result<Self, TriageError> {
        let service = Self::new(audit);
        service.install_policy(config)?;
        Ok(service)
    }

    /// Validates and atomically installs a new policy. The previous policy
    /// stays in force if validation fails.
    pub fn install_policy(&self, config: DecisionPolicyConfig) -> Result<(), TriageError> {
        config.validate()?;
        let version = config.version();
        let handle = Arc::new(PolicyHandle { config, version });
        let mut slot = self
            .policy
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        info!("installing decision policy {}", handle.version);
        *slot = Some(handle);
        Ok(())
    }

    pub fn active_version(&self) -> Option<String> {
        let slot = self
            .policy
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.as_ref().map(|h| h.version.clone())
    }

    /// Classifies one image's score vector. The audit append is
    /// fire-and-forget: a failed write is logged as a warning and never
    /// fails the response.
    pub fn classify(&self, sample_id: &str, scores: ScoreVector) -> Result<Decision, TriageError> {
        let handle = {
            let slot = self
                .policy
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slot.as_ref().cloned().ok_or(TriageError::ServiceNotReady)?
        };

        let label = decide(&scores, &handle.config);
        let adjusted = adjusted_scores(&scores, &handle.config);
        let confidence = decision_confidence(&adjusted, label);

        let record =
            AuditRecord::stamped(sample_id, scores, label, confidence, &handle.version);
        if let Err(err) = self.audit.append(&record) {
            warn!("audit append failed for sample {}: {}", sample_id, err);
        }

        Ok(Decision {
            label,
            confidence,
            policy_version: handle.version.clone(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/service/mod.rs"]
mod tests;
