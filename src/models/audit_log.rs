use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}
