//! Recycling transactions: one row per item of a session.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A persisted transaction. `quantity` is in storage units (pieces or grams).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecyclingTransaction {
    pub id: String,
    pub session_id: String,
    pub recycler_id: String,
    pub collection_centre_id: String,
    pub item_id: i32,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recycling_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub session_id: String,
    pub recycler_id: String,
    pub collection_centre_id: String,
    pub item_id: i32,
    pub quantity: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sessions::Entity",
        from = "Column::SessionId",
        to = "super::sessions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Sessions,
}

impl Related<super::sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RecyclingTransaction {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            session_id: model.session_id,
            recycler_id: model.recycler_id,
            collection_centre_id: model.collection_centre_id,
            item_id: model.item_id,
            quantity: model.quantity,
            created_at: model.created_at,
        }
    }
}
