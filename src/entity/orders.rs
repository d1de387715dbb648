use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub status: String,
    pub is_paid: bool,
    pub client_id: Uuid,
    pub manufacturer_id: Uuid,
    pub sub_manufacturer_id: Option<Uuid>,
    pub created_by: Uuid,
    pub sample_required: bool,
    pub sample_fee: Option<i64>,
    pub sample_eta: Option<Date>,
    pub sample_status: Option<String>,
    pub sample_notes: Option<String>,
    pub sample_routed_to: Option<String>,
    pub sample_workflow_status: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::clients::Entity",
        from = "Column::ClientId",
        to = "super::clients::Column::Id"
    )]
    Clients,
    #[sea_orm(has_many = "super::order_products::Entity")]
    OrderProducts,
    #[sea_orm(has_many = "super::order_media::Entity")]
    OrderMedia,
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::order_products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderProducts.def()
    }
}

impl Related<super::order_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderMedia.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
