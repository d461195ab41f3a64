use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, LedgerEntry, LedgerSource, ResultEngine, points_ledger,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

impl Engine {
    /// Sum of every ledger change of `user_id`.
    pub(super) async fn balance_in<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<i64> {
        let total: Option<Option<i64>> = points_ledger::Entity::find()
            .select_only()
            .column_as(points_ledger::Column::Change.sum(), "total")
            .filter(points_ledger::Column::UserId.eq(user_id))
            .into_tuple()
            .one(db)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }

    /// Current point balance of a user, recomputed from the ledger.
    pub async fn balance(&self, user_id: &str) -> ResultEngine<i64> {
        self.balance_in(&self.database, user_id).await
    }

    /// Ledger entries of a user, newest first.
    pub async fn ledger(&self, user_id: &str) -> ResultEngine<Vec<LedgerEntry>> {
        points_ledger::Entity::find()
            .filter(points_ledger::Column::UserId.eq(user_id))
            .order_by_desc(points_ledger::Column::CreatedAt)
            .order_by_desc(points_ledger::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }

    /// Append a manual entry to the ledger.
    ///
    /// Debits are serialized with redemptions and may not take the balance
    /// below zero. `voucher_redeem` entries are only written by
    /// [`Engine::redeem_voucher`].
    pub async fn adjust_points(
        &self,
        user_id: &str,
        change: i64,
        source: LedgerSource,
        reason: Option<&str>,
    ) -> ResultEngine<LedgerEntry> {
        if change == 0 {
            return Err(EngineError::InvalidInput(
                "change must not be zero".to_string(),
            ));
        }
        if source == LedgerSource::VoucherRedeem {
            return Err(EngineError::InvalidInput(
                "voucher_redeem entries are written by redemptions".to_string(),
            ));
        }
        let reason = normalize_optional_text(reason);

        let _guard = self.point_lock(user_id).lock().await;

        with_tx!(self, |db_tx| {
            self.require_profile(&db_tx, user_id).await?;
            if change < 0 {
                let balance = self.balance_in(&db_tx, user_id).await?;
                if balance + change < 0 {
                    return Err(EngineError::InsufficientPoints {
                        balance,
                        cost: -change,
                    });
                }
            }

            let model = points_ledger::ActiveModel {
                user_id: ActiveValue::Set(user_id.to_string()),
                change: ActiveValue::Set(change),
                source: ActiveValue::Set(source.as_str().to_string()),
                reason: ActiveValue::Set(reason),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            LedgerEntry::try_from(model)
        })
    }
}
