use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, Statement,
    TransactionTrait, Value, prelude::*,
};

use crate::{
    EngineError, LedgerSource, RedemptionStatus, ResultEngine, Voucher, VoucherRedemption,
    util::{new_id, normalize_optional_text, normalize_required_name},
    vouchers::{self, redemptions},
};

use super::{Engine, with_tx};

/// Debit the ledger only if the balance still covers the cost. Evaluated as
/// one statement so the check and the insert cannot interleave with another
/// writer.
const CONDITIONAL_DEBIT_SQL: &str = r#"INSERT INTO points_ledger
    (user_id, "change", source, reason, created_at)
SELECT ?, ?, ?, ?, ?
WHERE (SELECT COALESCE(SUM("change"), 0) FROM points_ledger WHERE user_id = ?) >= ?"#;

/// Input for [`Engine::create_voucher`].
#[derive(Clone, Debug)]
pub struct VoucherDraft {
    pub name: String,
    pub description: Option<String>,
    pub points_cost: i64,
    pub is_active: bool,
}

/// Partial update of a voucher. `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct VoucherUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub points_cost: Option<i64>,
    pub is_active: Option<bool>,
}

/// Outcome of a successful redemption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redeemed {
    pub redemption: VoucherRedemption,
    pub new_balance: i64,
}

fn validate_points_cost(points_cost: i64) -> ResultEngine<i64> {
    if points_cost <= 0 {
        return Err(EngineError::InvalidInput(
            "points_cost must be > 0".to_string(),
        ));
    }
    Ok(points_cost)
}

impl Engine {
    async fn require_voucher<C: ConnectionTrait>(
        &self,
        db: &C,
        voucher_id: &str,
    ) -> ResultEngine<vouchers::Model> {
        vouchers::Entity::find_by_id(voucher_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("voucher not exists".to_string()))
    }

    /// Active vouchers, cheapest first.
    pub async fn list_active_vouchers(&self) -> ResultEngine<Vec<Voucher>> {
        let models = vouchers::Entity::find()
            .filter(vouchers::Column::IsActive.eq(true))
            .order_by_asc(vouchers::Column::PointsCost)
            .order_by_asc(vouchers::Column::Name)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Voucher::from).collect())
    }

    /// Every voucher, newest first.
    pub async fn list_vouchers(&self) -> ResultEngine<Vec<Voucher>> {
        let models = vouchers::Entity::find()
            .order_by_desc(vouchers::Column::CreatedAt)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Voucher::from).collect())
    }

    pub async fn voucher(&self, voucher_id: &str) -> ResultEngine<Voucher> {
        Ok(Voucher::from(
            self.require_voucher(&self.database, voucher_id).await?,
        ))
    }

    pub async fn create_voucher(&self, draft: VoucherDraft) -> ResultEngine<Voucher> {
        let name = normalize_required_name(&draft.name, "voucher")?;
        let points_cost = validate_points_cost(draft.points_cost)?;
        let model = vouchers::ActiveModel {
            id: ActiveValue::Set(new_id()),
            name: ActiveValue::Set(name),
            description: ActiveValue::Set(normalize_optional_text(draft.description.as_deref())),
            points_cost: ActiveValue::Set(points_cost),
            is_active: ActiveValue::Set(draft.is_active),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;
        Ok(Voucher::from(model))
    }

    /// Update a voucher. Past redemptions keep the cost they were charged.
    pub async fn update_voucher(
        &self,
        voucher_id: &str,
        update: VoucherUpdate,
    ) -> ResultEngine<Voucher> {
        let name = update
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "voucher"))
            .transpose()?;
        let points_cost = update.points_cost.map(validate_points_cost).transpose()?;

        with_tx!(self, |db_tx| {
            let model = self.require_voucher(&db_tx, voucher_id).await?;
            let mut active: vouchers::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(description) = update.description.as_deref() {
                active.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }
            if let Some(points_cost) = points_cost {
                active.points_cost = ActiveValue::Set(points_cost);
            }
            if let Some(is_active) = update.is_active {
                active.is_active = ActiveValue::Set(is_active);
            }
            Ok(Voucher::from(active.update(&db_tx).await?))
        })
    }

    /// Delete a voucher that was never redeemed; deactivate it otherwise.
    pub async fn delete_voucher(&self, voucher_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_voucher(&db_tx, voucher_id).await?;
            let redeemed = redemptions::Entity::find()
                .filter(redemptions::Column::VoucherId.eq(voucher_id))
                .count(&db_tx)
                .await?;
            if redeemed > 0 {
                return Err(EngineError::ExistingKey(format!(
                    "voucher {voucher_id} has {redeemed} redemptions; deactivate it instead"
                )));
            }
            vouchers::Entity::delete_by_id(voucher_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Redeem a voucher for `user_id`.
    ///
    /// The balance check, the redemption row and the debiting ledger entry
    /// run in one database transaction while holding the user's point lock,
    /// so concurrent redemptions of the same user are applied one at a time.
    pub async fn redeem_voucher(&self, user_id: &str, voucher_id: &str) -> ResultEngine<Redeemed> {
        let _guard = self.point_lock(user_id).lock().await;

        with_tx!(self, |db_tx| {
            self.require_profile(&db_tx, user_id).await?;
            let voucher = self.require_voucher(&db_tx, voucher_id).await?;
            if !voucher.is_active {
                return Err(EngineError::VoucherUnavailable(format!(
                    "voucher '{}' is not active",
                    voucher.name
                )));
            }

            let cost = voucher.points_cost;
            let balance = self.balance_in(&db_tx, user_id).await?;
            if balance < cost {
                return Err(EngineError::InsufficientPoints { balance, cost });
            }

            let now = Utc::now();
            let redemption = redemptions::ActiveModel {
                id: ActiveValue::Set(new_id()),
                user_id: ActiveValue::Set(user_id.to_string()),
                voucher_id: ActiveValue::Set(voucher.id.clone()),
                points_spent: ActiveValue::Set(cost),
                status: ActiveValue::Set(RedemptionStatus::Redeemed.as_str().to_string()),
                created_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            let debit = db_tx
                .execute(Statement::from_sql_and_values(
                    db_tx.get_database_backend(),
                    CONDITIONAL_DEBIT_SQL,
                    [
                        Value::from(user_id),
                        Value::from(-cost),
                        Value::from(LedgerSource::VoucherRedeem.as_str()),
                        Value::from(Some(voucher.name.clone())),
                        Value::from(now),
                        Value::from(user_id),
                        Value::from(cost),
                    ],
                ))
                .await?;
            if debit.rows_affected() != 1 {
                return Err(EngineError::InsufficientPoints { balance, cost });
            }

            Ok(Redeemed {
                redemption: VoucherRedemption::try_from(redemption)?,
                new_balance: balance - cost,
            })
        })
    }
}
