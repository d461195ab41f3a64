use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, LedgerSource, NewProfile, Profile, RedemptionStatus, Role, VoucherDraft,
    VoucherUpdate,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, path)
}

async fn recycler(engine: &Engine, email: &str) -> Profile {
    engine
        .create_profile(NewProfile {
            email: email.to_string(),
            password: None,
            full_name: Some("Ann".to_string()),
            role: Role::Recycler,
        })
        .await
        .unwrap()
}

async fn voucher(engine: &Engine, name: &str, points_cost: i64) -> engine::Voucher {
    engine
        .create_voucher(VoucherDraft {
            name: name.to_string(),
            description: None,
            points_cost,
            is_active: true,
        })
        .await
        .unwrap()
}

async fn count(db: &DatabaseConnection, table: &str) -> i64 {
    let row = db
        .query_one(Statement::from_string(
            db.get_database_backend(),
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn balance_is_the_sum_of_ledger_changes() {
    let (engine, _db) = engine_with_db().await;
    let ann = recycler(&engine, "ann@example.com").await;
    let bob = recycler(&engine, "bob@example.com").await;

    assert_eq!(engine.balance(&ann.id).await.unwrap(), 0);

    engine
        .adjust_points(&ann.id, 100, LedgerSource::Recycling, Some("bottles"))
        .await
        .unwrap();
    engine
        .adjust_points(&ann.id, 50, LedgerSource::Recycling, None)
        .await
        .unwrap();
    engine
        .adjust_points(&ann.id, -30, LedgerSource::Adjustment, Some("correction"))
        .await
        .unwrap();
    engine
        .adjust_points(&bob.id, 70, LedgerSource::Recycling, None)
        .await
        .unwrap();

    let ledger = engine.ledger(&ann.id).await.unwrap();
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger[0].change, -30);
    assert_eq!(ledger[0].reason.as_deref(), Some("correction"));
    assert_eq!(engine::balance_of(&ledger), 120);
    assert_eq!(engine.balance(&ann.id).await.unwrap(), 120);
    assert_eq!(engine.balance(&bob.id).await.unwrap(), 70);
}

#[tokio::test]
async fn manual_entries_are_validated() {
    let (engine, _db) = engine_with_db().await;
    let ann = recycler(&engine, "ann@example.com").await;
    engine
        .adjust_points(&ann.id, 20, LedgerSource::Recycling, None)
        .await
        .unwrap();

    let err = engine
        .adjust_points(&ann.id, 0, LedgerSource::Adjustment, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .adjust_points(&ann.id, -5, LedgerSource::VoucherRedeem, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .adjust_points(&ann.id, -25, LedgerSource::Adjustment, None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientPoints {
            balance: 20,
            cost: 25
        }
    );

    let err = engine
        .adjust_points("missing", 10, LedgerSource::Recycling, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    assert_eq!(engine.balance(&ann.id).await.unwrap(), 20);
}

#[tokio::test]
async fn redemption_debits_exactly_the_voucher_cost() {
    let (engine, db) = engine_with_db().await;
    let ann = recycler(&engine, "ann@example.com").await;
    let coffee = voucher(&engine, "Free coffee", 40).await;
    engine
        .adjust_points(&ann.id, 100, LedgerSource::Recycling, None)
        .await
        .unwrap();

    let redeemed = engine.redeem_voucher(&ann.id, &coffee.id).await.unwrap();
    assert_eq!(redeemed.new_balance, 60);
    assert_eq!(redeemed.redemption.points_spent, 40);
    assert_eq!(redeemed.redemption.status, RedemptionStatus::Redeemed);
    assert_eq!(redeemed.redemption.user_id, ann.id);

    assert_eq!(engine.balance(&ann.id).await.unwrap(), 60);
    assert_eq!(count(&db, "voucher_redemptions").await, 1);

    let ledger = engine.ledger(&ann.id).await.unwrap();
    assert_eq!(ledger.len(), 2);
    let debit = ledger
        .iter()
        .find(|entry| entry.source == LedgerSource::VoucherRedeem)
        .unwrap();
    assert_eq!(debit.change, -40);
    assert_eq!(debit.reason.as_deref(), Some("Free coffee"));
}

#[tokio::test]
async fn redemption_without_enough_points_writes_nothing() {
    let (engine, db) = engine_with_db().await;
    let ann = recycler(&engine, "ann@example.com").await;
    let coffee = voucher(&engine, "Free coffee", 50).await;
    engine
        .adjust_points(&ann.id, 10, LedgerSource::Recycling, None)
        .await
        .unwrap();

    let err = engine.redeem_voucher(&ann.id, &coffee.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientPoints {
            balance: 10,
            cost: 50
        }
    );

    assert_eq!(engine.balance(&ann.id).await.unwrap(), 10);
    assert_eq!(engine.ledger(&ann.id).await.unwrap().len(), 1);
    assert_eq!(count(&db, "voucher_redemptions").await, 0);
}

#[tokio::test]
async fn inactive_or_missing_vouchers_cannot_be_redeemed() {
    let (engine, _db) = engine_with_db().await;
    let ann = recycler(&engine, "ann@example.com").await;
    let coffee = voucher(&engine, "Free coffee", 10).await;
    engine
        .adjust_points(&ann.id, 100, LedgerSource::Recycling, None)
        .await
        .unwrap();
    engine
        .update_voucher(
            &coffee.id,
            VoucherUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = engine.redeem_voucher(&ann.id, &coffee.id).await.unwrap_err();
    assert!(matches!(err, EngineError::VoucherUnavailable(_)));

    let err = engine.redeem_voucher(&ann.id, "missing").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    assert_eq!(engine.balance(&ann.id).await.unwrap(), 100);
}

#[tokio::test]
async fn concurrent_redemptions_never_overdraw() {
    let (engine, _db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    let ann = recycler(&engine, "ann@example.com").await;
    let coffee = voucher(&engine, "Free coffee", 30).await;
    engine
        .adjust_points(&ann.id, 100, LedgerSource::Recycling, None)
        .await
        .unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        let user_id = ann.id.clone();
        let voucher_id = coffee.id.clone();
        tasks.spawn(async move { engine.redeem_voucher(&user_id, &voucher_id).await });
    }

    let mut redeemed = 0;
    let mut refused = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(_) => redeemed += 1,
            Err(EngineError::InsufficientPoints { cost, .. }) => {
                assert_eq!(cost, 30);
                refused += 1;
            }
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(redeemed, 3);
    assert_eq!(refused, 5);
    assert_eq!(engine.balance(&ann.id).await.unwrap(), 10);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn active_vouchers_are_listed_cheapest_first() {
    let (engine, _db) = engine_with_db().await;
    let cinema = voucher(&engine, "Cinema ticket", 300).await;
    voucher(&engine, "Free coffee", 40).await;
    let hidden = voucher(&engine, "Tote bag", 10).await;
    engine
        .update_voucher(
            &hidden.id,
            VoucherUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let active = engine.list_active_vouchers().await.unwrap();
    let names: Vec<&str> = active.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["Free coffee", "Cinema ticket"]);

    assert_eq!(engine.list_vouchers().await.unwrap().len(), 3);

    let err = engine
        .update_voucher(
            &cinema.id,
            VoucherUpdate {
                points_cost: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn redeemed_vouchers_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let ann = recycler(&engine, "ann@example.com").await;
    let coffee = voucher(&engine, "Free coffee", 10).await;
    let unused = voucher(&engine, "Tote bag", 10).await;
    engine
        .adjust_points(&ann.id, 10, LedgerSource::Recycling, None)
        .await
        .unwrap();
    engine.redeem_voucher(&ann.id, &coffee.id).await.unwrap();

    let err = engine.delete_voucher(&coffee.id).await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    engine.delete_voucher(&unused.id).await.unwrap();
    let err = engine.voucher(&unused.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
