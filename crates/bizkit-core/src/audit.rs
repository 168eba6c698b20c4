//! Audit sink for lifecycle transitions.
//!
//! Sinks are best-effort: callers log a failed `record` and carry on, so a
//! broken sink can never abort a transition or a resolution pass.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// One audited lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    Installed {
        slug: String,
        at: DateTime<Utc>,
    },
    Activated {
        slug: String,
        actor: Option<String>,
        at: DateTime<Utc>,
    },
    Deactivated {
        slug: String,
        actor: Option<String>,
        at: DateTime<Utc>,
    },
    LegacyMigrated {
        slug: String,
        installed_at: DateTime<Utc>,
    },
}

impl AuditEvent {
    pub fn slug(&self) -> &str {
        match self {
            Self::Installed { slug, .. }
            | Self::Activated { slug, .. }
            | Self::Deactivated { slug, .. }
            | Self::LegacyMigrated { slug, .. } => slug,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Installed { .. } => "installed",
            Self::Activated { .. } => "activated",
            Self::Deactivated { .. } => "deactivated",
            Self::LegacyMigrated { .. } => "legacy_migrated",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("audit sink failure: {0}")]
pub struct AuditError(pub String);

pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// Default sink: structured `tracing` events on the `bizkit::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let payload =
            serde_json::to_string(event).map_err(|e| AuditError(e.to_string()))?;
        info!(
            target: "bizkit::audit",
            slug = event.slug(),
            kind = event.kind(),
            payload = %payload,
            "module lifecycle transition"
        );
        Ok(())
    }
}

/// Record `event`, logging and swallowing sink failures.
pub fn record_best_effort(sink: &dyn AuditSink, event: &AuditEvent) {
    if let Err(e) = sink.record(event) {
        tracing::warn!(slug = event.slug(), kind = event.kind(), error = %e, "audit sink rejected event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn record(&self, _event: &AuditEvent) -> Result<(), AuditError> {
            Err(AuditError("disk full".to_string()))
        }
    }

    #[test]
    fn failing_sink_does_not_panic() {
        let event = AuditEvent::Installed {
            slug: "billing".to_string(),
            at: Utc::now(),
        };
        record_best_effort(&FailingSink, &event);
        assert!(TracingAuditSink.record(&event).is_ok());
    }

    #[test]
    fn event_serializes_with_tag() {
        let event = AuditEvent::Deactivated {
            slug: "billing".to_string(),
            actor: Some("admin@example.com".to_string()),
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "deactivated");
        assert_eq!(json["slug"], "billing");
        assert_eq!(json["actor"], "admin@example.com");
    }
}
