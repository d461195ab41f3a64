use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Analytics, AnalyticsRange, RecyclingTransaction, ResultEngine, Role, analytics::aggregate,
    profiles, recycling_transactions,
};

use super::{Engine, with_tx};

impl Engine {
    /// Dashboard aggregates over the transactions inside `range`, as seen at `now`.
    pub async fn analytics(
        &self,
        range: AnalyticsRange,
        now: DateTime<Utc>,
    ) -> ResultEngine<Analytics> {
        with_tx!(self, |db_tx| {
            let mut query = recycling_transactions::Entity::find()
                .order_by_asc(recycling_transactions::Column::CreatedAt);
            if let Some(start) = range.start(now) {
                query = query.filter(recycling_transactions::Column::CreatedAt.gte(start));
            }
            let transactions: Vec<RecyclingTransaction> = query
                .all(&db_tx)
                .await?
                .into_iter()
                .map(RecyclingTransaction::from)
                .collect();

            let item_names: HashMap<i32, String> = self
                .item_catalog(&db_tx)
                .await?
                .into_values()
                .map(|item| (item.id, item.name))
                .collect();

            let centre_names: HashMap<String, String> = profiles::Entity::find()
                .filter(profiles::Column::Role.eq(Role::CentreStaff.as_str()))
                .all(&db_tx)
                .await?
                .into_iter()
                .filter_map(|model| model.full_name.map(|name| (model.id, name)))
                .collect();

            Ok(aggregate(&transactions, &item_names, &centre_names))
        })
    }
}
