use sea_orm::entity::prelude::*;

/// Stock of one accessory type held by a manufacturer for one client.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "manufacturer_accessories_inventory")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub manufacturer_id: Uuid,
    pub client_id: Uuid,
    pub accessory_type_id: Uuid,
    pub quantity_on_hand: i32,
    pub low_stock_threshold: i32,
    pub notes: Option<String>,
    pub source_language: Option<String>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accessory_types::Entity",
        from = "Column::AccessoryTypeId",
        to = "super::accessory_types::Column::Id"
    )]
    AccessoryTypes,
}

impl Related<super::accessory_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccessoryTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
