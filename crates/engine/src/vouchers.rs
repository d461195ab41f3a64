//! Vouchers and their redemptions.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Voucher {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vouchers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i64,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Voucher {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            points_cost: model.points_cost,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

/// Status of a redemption. A redemption row is only ever written once the
/// points are debited, so `Redeemed` is the only persisted state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Redeemed,
}

impl RedemptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redeemed => "redeemed",
        }
    }
}

impl TryFrom<&str> for RedemptionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "redeemed" => Ok(Self::Redeemed),
            other => Err(EngineError::InvalidInput(format!(
                "invalid redemption status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoucherRedemption {
    pub id: String,
    pub user_id: String,
    pub voucher_id: String,
    pub points_spent: i64,
    pub status: RedemptionStatus,
    pub created_at: DateTime<Utc>,
}

pub mod redemptions {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "voucher_redemptions")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub user_id: String,
        pub voucher_id: String,
        pub points_spent: i64,
        pub status: String,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::Entity",
            from = "Column::VoucherId",
            to = "super::Column::Id",
            on_update = "NoAction",
            on_delete = "NoAction"
        )]
        Vouchers,
    }

    impl Related<super::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Vouchers.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

impl TryFrom<redemptions::Model> for VoucherRedemption {
    type Error = EngineError;

    fn try_from(model: redemptions::Model) -> ResultEngine<Self> {
        Ok(Self {
            status: RedemptionStatus::try_from(model.status.as_str())?,
            id: model.id,
            user_id: model.user_id,
            voucher_id: model.voucher_id,
            points_spent: model.points_spent,
            created_at: model.created_at,
        })
    }
}
