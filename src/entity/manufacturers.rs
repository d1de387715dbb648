use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "manufacturers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::accessory_types::Entity")]
    AccessoryTypes,
}

impl Related<super::accessory_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccessoryTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
