use std::hash::{DefaultHasher, Hash, Hasher};

use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;

mod analytics;
mod items;
mod points;
mod profiles;
mod sessions;
mod vouchers;

pub use profiles::{NewProfile, ProfileUpdate};
pub use sessions::{BasketItem, CentreTransaction, CentreTransactions};
pub use vouchers::{Redeemed, VoucherDraft, VoucherUpdate};

/// Number of point locks. Users are spread over them by a hash of their id.
const POINT_LOCK_SHARDS: usize = 64;

use crate::ResultEngine;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    /// Held while a balance is checked and debited. Indexed by
    /// [`Engine::point_lock`].
    point_locks: Box<[Mutex<()>]>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Returns true when the database answers a ping.
    pub async fn database_ready(&self) -> bool {
        self.database.ping().await.is_ok()
    }

    /// The lock guarding the balance of `user_id`. Always the same lock for
    /// the same id; unrelated users may share one.
    fn point_lock(&self, user_id: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        user_id.hash(&mut hasher);
        let index = (hasher.finish() % self.point_locks.len() as u64) as usize;
        &self.point_locks[index]
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            point_locks: (0..POINT_LOCK_SHARDS).map(|_| Mutex::new(())).collect(),
        })
    }
}
