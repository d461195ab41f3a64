//! Recycling sessions.
//!
//! A session is one visit of a recycler to a collection centre. It groups the
//! transactions recorded by the centre staff during that visit.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecyclingSession {
    pub id: String,
    pub recycler_id: String,
    pub collection_centre_id: String,
    pub created_at: DateTime<Utc>,
}

impl RecyclingSession {
    /// Returns true when `staff_id` is the centre that recorded the session.
    pub fn is_owned_by(&self, staff_id: &str) -> bool {
        self.collection_centre_id == staff_id
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recycling_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub recycler_id: String,
    pub collection_centre_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recycling_transactions::Entity")]
    Transactions,
}

impl Related<super::recycling_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RecyclingSession {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            recycler_id: model.recycler_id,
            collection_centre_id: model.collection_centre_id,
            created_at: model.created_at,
        }
    }
}
