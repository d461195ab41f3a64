//! Seed the item catalog with the materials every centre accepts.

use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

use super::m20261014_000001_init::RecyclableItems;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// `(id, name, measurement)`. Weight items are recorded in grams.
const SEED_ITEMS: [(i32, &str, &str); 5] = [
    (1, "Plastic Bottle", "count"),
    (2, "Aluminium Tin", "count"),
    (3, "Newspaper", "weight"),
    (4, "Glass", "count"),
    (5, "Cardboard", "weight"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        for (id, name, measurement) in SEED_ITEMS {
            let stmt = Query::insert()
                .into_table(RecyclableItems::Table)
                .columns([
                    RecyclableItems::Id,
                    RecyclableItems::Name,
                    RecyclableItems::NameNorm,
                    RecyclableItems::Measurement,
                ])
                .values_panic([
                    id.into(),
                    name.into(),
                    name.to_lowercase().into(),
                    measurement.into(),
                ])
                .to_owned();
            db.execute(backend.build(&stmt)).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let stmt = Query::delete()
            .from_table(RecyclableItems::Table)
            .and_where(Expr::col(RecyclableItems::Id).is_in(SEED_ITEMS.map(|(id, ..)| id)))
            .to_owned();
        manager.exec_stmt(stmt).await
    }
}
