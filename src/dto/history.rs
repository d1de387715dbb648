use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// One rendered audit entry.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryLine {
    pub id: Uuid,
    pub action_type: String,
    pub icon: String,
    pub label: String,
    pub user_name: String,
    pub target_type: String,
    pub target_id: Uuid,
    /// One line per field change, e.g. `Sample fee: $10.00 → $20.00`.
    pub details: Vec<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryList {
    pub items: Vec<HistoryLine>,
}
