use sea_orm::entity::prelude::*;

/// Append-only; the table rejects updates and deletes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub user_name: String,
    pub action_type: String,
    pub target_type: String,
    pub target_id: Uuid,
    pub order_id: Option<Uuid>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changes: Json,
    pub note: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
