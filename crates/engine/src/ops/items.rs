use std::collections::HashMap;

use sea_orm::{
    ActiveValue, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*,
};

use crate::{
    EngineError, Measurement, RecyclableItem, ResultEngine, items, recycling_transactions,
    util::{name_key, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// All catalog items keyed by id.
    pub(super) async fn item_catalog<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> ResultEngine<HashMap<i32, RecyclableItem>> {
        items::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|model| RecyclableItem::try_from(model).map(|item| (item.id, item)))
            .collect()
    }

    async fn ensure_item_name_free<C: ConnectionTrait>(
        &self,
        db: &C,
        name: &str,
        except_id: Option<i32>,
    ) -> ResultEngine<()> {
        let mut query = items::Entity::find().filter(items::Column::NameNorm.eq(name_key(name)));
        if let Some(id) = except_id {
            query = query.filter(items::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    /// List the catalog ordered by id.
    pub async fn list_items(&self) -> ResultEngine<Vec<RecyclableItem>> {
        items::Entity::find()
            .order_by_asc(items::Column::Id)
            .all(&self.database)
            .await?
            .into_iter()
            .map(RecyclableItem::try_from)
            .collect()
    }

    pub async fn create_item(
        &self,
        name: &str,
        measurement: Measurement,
    ) -> ResultEngine<RecyclableItem> {
        let name = normalize_required_name(name, "item")?;
        with_tx!(self, |db_tx| {
            self.ensure_item_name_free(&db_tx, &name, None).await?;
            let model = items::ActiveModel {
                name_norm: ActiveValue::Set(name_key(&name)),
                name: ActiveValue::Set(name),
                measurement: ActiveValue::Set(measurement.as_str().to_string()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            RecyclableItem::try_from(model)
        })
    }

    /// Rename an item or change how it is measured.
    ///
    /// Stored quantities are not converted; changing the measurement of an
    /// item that already has transactions changes how they are displayed.
    pub async fn update_item(
        &self,
        item_id: i32,
        name: Option<&str>,
        measurement: Option<Measurement>,
    ) -> ResultEngine<RecyclableItem> {
        let name = name
            .map(|name| normalize_required_name(name, "item"))
            .transpose()?;
        with_tx!(self, |db_tx| {
            let model = items::Entity::find_by_id(item_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("item not exists".to_string()))?;
            let mut active: items::ActiveModel = model.into();

            if let Some(name) = name {
                self.ensure_item_name_free(&db_tx, &name, Some(item_id))
                    .await?;
                active.name_norm = ActiveValue::Set(name_key(&name));
                active.name = ActiveValue::Set(name);
            }
            if let Some(measurement) = measurement {
                active.measurement = ActiveValue::Set(measurement.as_str().to_string());
            }

            RecyclableItem::try_from(active.update(&db_tx).await?)
        })
    }

    /// Delete an item that no transaction references.
    pub async fn delete_item(&self, item_id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            items::Entity::find_by_id(item_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("item not exists".to_string()))?;

            let used = recycling_transactions::Entity::find()
                .filter(recycling_transactions::Column::ItemId.eq(item_id))
                .count(&db_tx)
                .await?;
            if used > 0 {
                return Err(EngineError::ExistingKey(format!(
                    "item {item_id} is referenced by {used} transactions"
                )));
            }

            items::Entity::delete_by_id(item_id).exec(&db_tx).await?;
            Ok(())
        })
    }
}
