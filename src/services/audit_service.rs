use chrono::Utc;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::audit_log::AuditEntry;
use crate::store::Store;

/// Append-only audit trail for integration-facing actions.
#[derive(Clone)]
pub struct AuditService {
    store: Store,
}

impl AuditService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn record(
        &self,
        actor: Option<String>,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        details: Option<JsonValue>,
    ) {
        self.store.append_audit(AuditEntry {
            id: Uuid::new_v4(),
            actor,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            details,
            created_at: Utc::now(),
        });
    }

    pub fn for_entity(&self, entity_id: Uuid) -> Vec<AuditEntry> {
        self.store.audit_for_entity(entity_id)
    }
}
