use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_product_id: Uuid,
    pub variant_combo: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub admin_status: String,
    pub manufacturer_status: String,
    pub standard_price: Option<i64>,
    pub bulk_price: Option<i64>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order_products::Entity",
        from = "Column::OrderProductId",
        to = "super::order_products::Column::Id"
    )]
    OrderProducts,
}

impl Related<super::order_products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderProducts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
