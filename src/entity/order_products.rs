use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_status: String,
    pub routed_to: String,
    pub is_locked: bool,
    pub is_invoiced: bool,
    pub requires_sample: bool,
    pub requires_client_approval: bool,
    pub manufacturer_standard_price: Option<i64>,
    pub manufacturer_bulk_price: Option<i64>,
    pub client_standard_price: Option<i64>,
    pub client_bulk_price: Option<i64>,
    pub admin_notes: Option<String>,
    pub manufacturer_notes: Option<String>,
    pub client_notes: Option<String>,
    pub internal_notes: Option<String>,
    pub shipped_date: Option<DateTimeWithTimeZone>,
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Orders,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id"
    )]
    Products,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::order_media::Entity")]
    OrderMedia,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::order_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderMedia.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
