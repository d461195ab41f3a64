use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{BasketItem, Engine, EngineError, NewProfile, Profile, Role};
use migration::MigratorTrait;

const PLASTIC_BOTTLE: i32 = 1;
const NEWSPAPER: i32 = 3;
const CARDBOARD: i32 = 5;

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

async fn profile(engine: &Engine, email: &str, name: &str, role: Role) -> Profile {
    engine
        .create_profile(NewProfile {
            email: email.to_string(),
            password: None,
            full_name: Some(name.to_string()),
            role,
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

fn line(item_id: i32, quantity: f64) -> BasketItem {
    BasketItem { item_id, quantity }
}

#[tokio::test]
async fn weight_items_are_stored_in_grams_and_listed_in_kg() {
    let (engine, _db) = engine_with_db().await;
    let staff = profile(&engine, "north@centre.org", "North Centre", Role::CentreStaff).await;
    let recycler = profile(&engine, "ann@example.com", "Ann", Role::Recycler).await;

    let session = engine
        .create_session(
            &staff.id,
            &recycler.id,
            &[line(NEWSPAPER, 1.2), line(CARDBOARD, 2.5), line(PLASTIC_BOTTLE, 4.0)],
        )
        .await
        .unwrap();
    assert_eq!(session.collection_centre_id, staff.id);
    assert_eq!(session.recycler_id, recycler.id);

    let listing = engine
        .list_centre_transactions(&staff.id, None)
        .await
        .unwrap();
    assert_eq!(listing.transactions.len(), 3);

    let newspaper = listing
        .transactions
        .iter()
        .find(|row| row.transaction.item_id == NEWSPAPER)
        .unwrap();
    assert_eq!(newspaper.transaction.quantity, 1200);
    assert_eq!(newspaper.display_quantity, 1.2);
    assert_eq!(newspaper.item_name, "Newspaper");
    assert_eq!(
        newspaper.recycler.as_ref().map(|p| p.public_id.as_str()),
        Some(recycler.public_id.as_str())
    );

    let cardboard = listing
        .transactions
        .iter()
        .find(|row| row.transaction.item_id == CARDBOARD)
        .unwrap();
    assert_eq!(cardboard.transaction.quantity, 2500);
    assert_eq!(cardboard.display_quantity, 2.5);

    assert_eq!(listing.centre_totals.get("Plastic Bottle"), Some(&4.0));
    assert_eq!(listing.recycler_totals, None);
}

#[tokio::test]
async fn basket_without_positive_quantities_writes_nothing() {
    let (engine, db) = engine_with_db().await;
    let staff = profile(&engine, "north@centre.org", "North Centre", Role::CentreStaff).await;
    let recycler = profile(&engine, "ann@example.com", "Ann", Role::Recycler).await;

    let err = engine
        .create_session(
            &staff.id,
            &recycler.id,
            &[line(PLASTIC_BOTTLE, 0.0), line(NEWSPAPER, 0.0004)],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    assert_eq!(count(&db, "recycling_sessions").await, 0);
    assert_eq!(count(&db, "recycling_transactions").await, 0);
}

#[tokio::test]
async fn unknown_items_reject_the_whole_session() {
    let (engine, db) = engine_with_db().await;
    let staff = profile(&engine, "north@centre.org", "North Centre", Role::CentreStaff).await;
    let recycler = profile(&engine, "ann@example.com", "Ann", Role::Recycler).await;

    let err = engine
        .create_session(
            &staff.id,
            &recycler.id,
            &[line(PLASTIC_BOTTLE, 2.0), line(999, 1.0)],
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidInput("unknown item 999".to_string()));
    assert_eq!(count(&db, "recycling_sessions").await, 0);
}

#[tokio::test]
async fn sessions_need_staff_and_a_recycler() {
    let (engine, _db) = engine_with_db().await;
    let staff = profile(&engine, "north@centre.org", "North Centre", Role::CentreStaff).await;
    let other_staff = profile(&engine, "south@centre.org", "South Centre", Role::CentreStaff).await;
    let recycler = profile(&engine, "ann@example.com", "Ann", Role::Recycler).await;

    let err = engine
        .create_session(&recycler.id, &recycler.id, &[line(PLASTIC_BOTTLE, 1.0)])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .create_session(&staff.id, &other_staff.id, &[line(PLASTIC_BOTTLE, 1.0)])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotRecycler(_)));

    let err = engine
        .create_session(&staff.id, "missing", &[line(PLASTIC_BOTTLE, 1.0)])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn update_replaces_the_items_of_a_session() {
    let (engine, db) = engine_with_db().await;
    let staff = profile(&engine, "north@centre.org", "North Centre", Role::CentreStaff).await;
    let recycler = profile(&engine, "ann@example.com", "Ann", Role::Recycler).await;

    let session = engine
        .create_session(
            &staff.id,
            &recycler.id,
            &[line(PLASTIC_BOTTLE, 3.0), line(NEWSPAPER, 1.0)],
        )
        .await
        .unwrap();

    let updated = engine
        .update_session(&staff.id, &session.id, &[line(CARDBOARD, 0.75)])
        .await
        .unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].item_id, CARDBOARD);
    assert_eq!(updated[0].quantity, 750);
    assert_eq!(updated[0].session_id, session.id);
    assert_eq!(updated[0].recycler_id, recycler.id);
    assert_eq!(updated[0].created_at, session.created_at);
    assert_eq!(count(&db, "recycling_transactions").await, 1);

    // An empty edit fails and keeps the previous rows.
    let err = engine
        .update_session(&staff.id, &session.id, &[line(CARDBOARD, 0.0)])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
    assert_eq!(count(&db, "recycling_transactions").await, 1);
}

#[tokio::test]
async fn other_centres_cannot_edit_or_delete_a_session() {
    let (engine, db) = engine_with_db().await;
    let staff = profile(&engine, "north@centre.org", "North Centre", Role::CentreStaff).await;
    let other_staff = profile(&engine, "south@centre.org", "South Centre", Role::CentreStaff).await;
    let recycler = profile(&engine, "ann@example.com", "Ann", Role::Recycler).await;

    let session = engine
        .create_session(&staff.id, &recycler.id, &[line(PLASTIC_BOTTLE, 3.0)])
        .await
        .unwrap();

    let err = engine
        .update_session(&other_staff.id, &session.id, &[line(NEWSPAPER, 5.0)])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .delete_session(&other_staff.id, &session.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let listing = engine
        .list_centre_transactions(&staff.id, None)
        .await
        .unwrap();
    assert_eq!(listing.transactions.len(), 1);
    assert_eq!(listing.transactions[0].transaction.item_id, PLASTIC_BOTTLE);
    assert_eq!(listing.transactions[0].transaction.quantity, 3);
    assert_eq!(count(&db, "recycling_sessions").await, 1);
}

#[tokio::test]
async fn delete_removes_session_and_transactions() {
    let (engine, db) = engine_with_db().await;
    let staff = profile(&engine, "north@centre.org", "North Centre", Role::CentreStaff).await;
    let recycler = profile(&engine, "ann@example.com", "Ann", Role::Recycler).await;

    let session = engine
        .create_session(
            &staff.id,
            &recycler.id,
            &[line(PLASTIC_BOTTLE, 3.0), line(NEWSPAPER, 2.0)],
        )
        .await
        .unwrap();
    engine.delete_session(&staff.id, &session.id).await.unwrap();

    assert_eq!(count(&db, "recycling_sessions").await, 0);
    assert_eq!(count(&db, "recycling_transactions").await, 0);

    let err = engine
        .delete_session(&staff.id, &session.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn listing_filters_by_recycler_and_keeps_centre_totals() {
    let (engine, _db) = engine_with_db().await;
    let staff = profile(&engine, "north@centre.org", "North Centre", Role::CentreStaff).await;
    let other_staff = profile(&engine, "south@centre.org", "South Centre", Role::CentreStaff).await;
    let ann = profile(&engine, "ann@example.com", "Ann", Role::Recycler).await;
    let bob = profile(&engine, "bob@example.com", "Bob", Role::Recycler).await;

    engine
        .create_session(&staff.id, &ann.id, &[line(PLASTIC_BOTTLE, 2.0)])
        .await
        .unwrap();
    engine
        .create_session(&staff.id, &bob.id, &[line(PLASTIC_BOTTLE, 5.0), line(NEWSPAPER, 1.5)])
        .await
        .unwrap();
    engine
        .create_session(&other_staff.id, &ann.id, &[line(PLASTIC_BOTTLE, 10.0)])
        .await
        .unwrap();

    let listing = engine
        .list_centre_transactions(&staff.id, Some(&ann.id))
        .await
        .unwrap();

    assert_eq!(listing.transactions.len(), 1);
    assert_eq!(listing.transactions[0].transaction.recycler_id, ann.id);
    assert_eq!(listing.centre_totals.get("Plastic Bottle"), Some(&7.0));
    assert_eq!(listing.centre_totals.get("Newspaper"), Some(&1.5));

    let recycler_totals = listing.recycler_totals.unwrap();
    assert_eq!(recycler_totals.get("Plastic Bottle"), Some(&2.0));
    assert_eq!(recycler_totals.get("Newspaper"), None);
}
