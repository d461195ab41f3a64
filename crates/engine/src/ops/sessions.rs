use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, Measurement, Profile, RecyclableItem, RecyclingSession, RecyclingTransaction,
    ResultEngine, Role, analytics::item_label, profiles, recycling_transactions, sessions,
    util::new_id,
};

use super::{Engine, with_tx};

/// One line of the basket typed by centre staff: kilograms for weight items,
/// pieces for count items.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BasketItem {
    pub item_id: i32,
    pub quantity: f64,
}

/// A transaction of the acting centre, ready for display.
#[derive(Clone, Debug, PartialEq)]
pub struct CentreTransaction {
    pub transaction: RecyclingTransaction,
    pub item_name: String,
    /// `quantity` converted back to kg for weight items.
    pub display_quantity: f64,
    pub recycler: Option<Profile>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CentreTransactions {
    /// Newest first.
    pub transactions: Vec<CentreTransaction>,
    /// Display totals per item name over every transaction of the centre.
    pub centre_totals: BTreeMap<String, f64>,
    /// Display totals per item name for the requested recycler, if any.
    pub recycler_totals: Option<BTreeMap<String, f64>>,
}

/// Turn a basket into `(item_id, stored_quantity)` rows.
///
/// Lines with a non-positive quantity are skipped before the catalog is
/// consulted. Fails when nothing is left to record.
fn normalize_basket(
    catalog: &HashMap<i32, RecyclableItem>,
    basket: &[BasketItem],
) -> ResultEngine<Vec<(i32, i64)>> {
    let mut rows = Vec::with_capacity(basket.len());
    for line in basket {
        if line.quantity.is_finite() && line.quantity <= 0.0 {
            continue;
        }
        let item = catalog.get(&line.item_id).ok_or_else(|| {
            EngineError::InvalidInput(format!("unknown item {}", line.item_id))
        })?;
        if let Some(quantity) = item.measurement.normalize_quantity(line.quantity)? {
            rows.push((item.id, quantity));
        }
    }

    if rows.is_empty() {
        return Err(EngineError::InvalidInput(
            "At least one item with quantity > 0 is required".to_string(),
        ));
    }
    Ok(rows)
}

fn display_quantity(catalog: &HashMap<i32, RecyclableItem>, tx: &RecyclingTransaction) -> f64 {
    catalog
        .get(&tx.item_id)
        .map_or(Measurement::Count, |item| item.measurement)
        .display_quantity(tx.quantity)
}

fn transaction_models(
    session: &sessions::Model,
    rows: &[(i32, i64)],
    created_at: DateTime<Utc>,
) -> Vec<recycling_transactions::ActiveModel> {
    rows.iter()
        .map(|(item_id, quantity)| recycling_transactions::ActiveModel {
            id: ActiveValue::Set(new_id()),
            session_id: ActiveValue::Set(session.id.clone()),
            recycler_id: ActiveValue::Set(session.recycler_id.clone()),
            collection_centre_id: ActiveValue::Set(session.collection_centre_id.clone()),
            item_id: ActiveValue::Set(*item_id),
            quantity: ActiveValue::Set(*quantity),
            created_at: ActiveValue::Set(created_at),
        })
        .collect()
}

impl Engine {
    async fn require_recording_staff(
        &self,
        db: &DatabaseTransaction,
        staff_id: &str,
    ) -> ResultEngine<()> {
        let model = profiles::Entity::find_by_id(staff_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::Unauthorized("unknown staff profile".to_string()))?;
        let role = Role::try_from(model.role.as_str())?;
        if !role.can_record_sessions() {
            return Err(EngineError::Forbidden(
                "only centre staff can record sessions".to_string(),
            ));
        }
        Ok(())
    }

    /// Load a session and check that `staff_id` is the centre that owns it.
    async fn require_owned_session(
        &self,
        db: &DatabaseTransaction,
        session_id: &str,
        staff_id: &str,
    ) -> ResultEngine<sessions::Model> {
        let model = sessions::Entity::find_by_id(session_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("session not exists".to_string()))?;
        if model.collection_centre_id != staff_id {
            return Err(EngineError::Forbidden(
                "session belongs to another collection centre".to_string(),
            ));
        }
        Ok(model)
    }

    /// Record a recycling session for `recycler_id` at the centre `staff_id`.
    ///
    /// The session and its transactions are written in one database
    /// transaction: either all rows exist afterwards or none do.
    pub async fn create_session(
        &self,
        staff_id: &str,
        recycler_id: &str,
        basket: &[BasketItem],
    ) -> ResultEngine<RecyclingSession> {
        let created_at = Utc::now();
        with_tx!(self, |db_tx| {
            self.require_recording_staff(&db_tx, staff_id).await?;
            self.require_recycler(&db_tx, recycler_id).await?;
            let catalog = self.item_catalog(&db_tx).await?;
            let rows = normalize_basket(&catalog, basket)?;

            let session = sessions::ActiveModel {
                id: ActiveValue::Set(new_id()),
                recycler_id: ActiveValue::Set(recycler_id.to_string()),
                collection_centre_id: ActiveValue::Set(staff_id.to_string()),
                created_at: ActiveValue::Set(created_at),
            }
            .insert(&db_tx)
            .await?;

            recycling_transactions::Entity::insert_many(transaction_models(
                &session, &rows, created_at,
            ))
            .exec(&db_tx)
            .await?;

            Ok(RecyclingSession::from(session))
        })
    }

    /// Replace every transaction of a session with `basket`.
    ///
    /// The new rows keep the session's recycler, centre and timestamp.
    pub async fn update_session(
        &self,
        staff_id: &str,
        session_id: &str,
        basket: &[BasketItem],
    ) -> ResultEngine<Vec<RecyclingTransaction>> {
        with_tx!(self, |db_tx| {
            let session = self
                .require_owned_session(&db_tx, session_id, staff_id)
                .await?;
            let catalog = self.item_catalog(&db_tx).await?;
            let rows = normalize_basket(&catalog, basket)?;

            recycling_transactions::Entity::delete_many()
                .filter(recycling_transactions::Column::SessionId.eq(session.id.as_str()))
                .exec(&db_tx)
                .await?;
            recycling_transactions::Entity::insert_many(transaction_models(
                &session,
                &rows,
                session.created_at,
            ))
            .exec(&db_tx)
            .await?;

            let models = recycling_transactions::Entity::find()
                .filter(recycling_transactions::Column::SessionId.eq(session.id.as_str()))
                .order_by_asc(recycling_transactions::Column::ItemId)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(RecyclingTransaction::from).collect())
        })
    }

    /// Delete a session together with its transactions.
    pub async fn delete_session(&self, staff_id: &str, session_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let session = self
                .require_owned_session(&db_tx, session_id, staff_id)
                .await?;

            recycling_transactions::Entity::delete_many()
                .filter(recycling_transactions::Column::SessionId.eq(session.id.as_str()))
                .exec(&db_tx)
                .await?;
            sessions::Entity::delete_by_id(session.id).exec(&db_tx).await?;
            Ok(())
        })
    }

    /// Transactions recorded by the centre `staff_id`, newest first.
    pub async fn list_centre_transactions(
        &self,
        staff_id: &str,
        recycler_id: Option<&str>,
    ) -> ResultEngine<CentreTransactions> {
        with_tx!(self, |db_tx| {
            let models = recycling_transactions::Entity::find()
                .filter(recycling_transactions::Column::CollectionCentreId.eq(staff_id))
                .order_by_desc(recycling_transactions::Column::CreatedAt)
                .order_by_asc(recycling_transactions::Column::Id)
                .all(&db_tx)
                .await?;
            let catalog = self.item_catalog(&db_tx).await?;
            let item_names: HashMap<i32, String> = catalog
                .values()
                .map(|item| (item.id, item.name.clone()))
                .collect();

            let recycler_ids: HashSet<&str> =
                models.iter().map(|m| m.recycler_id.as_str()).collect();
            let recyclers: HashMap<String, Profile> = profiles::Entity::find()
                .filter(profiles::Column::Id.is_in(recycler_ids))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| Profile::try_from(model).map(|p| (p.id.clone(), p)))
                .collect::<ResultEngine<_>>()?;

            let mut result = CentreTransactions {
                recycler_totals: recycler_id.map(|_| BTreeMap::new()),
                ..Default::default()
            };
            for model in models {
                let tx = RecyclingTransaction::from(model);
                let item_name = item_label(&item_names, tx.item_id);
                let display_quantity = display_quantity(&catalog, &tx);

                *result.centre_totals.entry(item_name.clone()).or_insert(0.0) += display_quantity;
                if recycler_id.is_some_and(|id| id != tx.recycler_id) {
                    continue;
                }
                if let Some(totals) = result.recycler_totals.as_mut() {
                    *totals.entry(item_name.clone()).or_insert(0.0) += display_quantity;
                }

                result.transactions.push(CentreTransaction {
                    recycler: recyclers.get(&tx.recycler_id).cloned(),
                    transaction: tx,
                    item_name,
                    display_quantity,
                });
            }

            Ok(result)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> HashMap<i32, RecyclableItem> {
        HashMap::from([
            (
                1,
                RecyclableItem {
                    id: 1,
                    name: "Plastic Bottle".to_string(),
                    measurement: Measurement::Count,
                },
            ),
            (
                3,
                RecyclableItem {
                    id: 3,
                    name: "Newspaper".to_string(),
                    measurement: Measurement::Weight,
                },
            ),
        ])
    }

    #[test]
    fn basket_converts_weight_items_to_grams() {
        let rows = normalize_basket(
            &catalog(),
            &[
                BasketItem { item_id: 3, quantity: 1.2 },
                BasketItem { item_id: 1, quantity: 4.0 },
            ],
        )
        .unwrap();
        assert_eq!(rows, vec![(3, 1200), (1, 4)]);
    }

    #[test]
    fn basket_skips_empty_lines_before_catalog_lookup() {
        let rows = normalize_basket(
            &catalog(),
            &[
                BasketItem { item_id: 99, quantity: 0.0 },
                BasketItem { item_id: 1, quantity: 2.0 },
            ],
        )
        .unwrap();
        assert_eq!(rows, vec![(1, 2)]);
    }

    #[test]
    fn basket_with_only_zero_quantities_is_rejected() {
        let err = normalize_basket(
            &catalog(),
            &[
                BasketItem { item_id: 1, quantity: 0.0 },
                BasketItem { item_id: 3, quantity: 0.0 },
            ],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn basket_rejects_unknown_items() {
        let err = normalize_basket(&catalog(), &[BasketItem { item_id: 42, quantity: 1.0 }])
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidInput("unknown item 42".to_string()));
    }
}
