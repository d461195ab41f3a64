//! Points ledger.
//!
//! The ledger is append-only: every change of a user's points is a new row
//! with a signed `change`. No balance is stored anywhere; the balance of a
//! user is the sum of all of their entries.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Why a ledger entry was written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerSource {
    /// Points credited for recycled material.
    Recycling,
    /// Debit written when a voucher is redeemed.
    VoucherRedeem,
    /// Manual correction posted by an administrator.
    Adjustment,
}

impl LedgerSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recycling => "recycling",
            Self::VoucherRedeem => "voucher_redeem",
            Self::Adjustment => "adjustment",
        }
    }
}

impl TryFrom<&str> for LedgerSource {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "recycling" => Ok(Self::Recycling),
            "voucher_redeem" => Ok(Self::VoucherRedeem),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(EngineError::InvalidInput(format!(
                "invalid ledger source: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: String,
    pub change: i64,
    pub source: LedgerSource,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Sum of `change` over `entries`.
pub fn balance_of<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> i64 {
    entries.into_iter().map(|entry| entry.change).sum()
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "points_ledger")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    pub change: i64,
    pub source: String,
    pub reason: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            source: LedgerSource::try_from(model.source.as_str())?,
            id: model.id,
            user_id: model.user_id,
            change: model.change,
            reason: model.reason,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(change: i64, source: LedgerSource) -> LedgerEntry {
        LedgerEntry {
            id: 0,
            user_id: "u".to_string(),
            change,
            source,
            reason: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn balance_is_the_sum_of_changes() {
        let entries = vec![
            entry(100, LedgerSource::Recycling),
            entry(50, LedgerSource::Adjustment),
            entry(-120, LedgerSource::VoucherRedeem),
        ];
        assert_eq!(balance_of(&entries), 30);
    }

    #[test]
    fn empty_ledger_has_zero_balance() {
        assert_eq!(balance_of(&Vec::new()), 0);
    }

    #[test]
    fn source_round_trips_through_storage_string() {
        for source in [
            LedgerSource::Recycling,
            LedgerSource::VoucherRedeem,
            LedgerSource::Adjustment,
        ] {
            assert_eq!(LedgerSource::try_from(source.as_str()).unwrap(), source);
        }
        assert!(LedgerSource::try_from("bonus").is_err());
    }
}
