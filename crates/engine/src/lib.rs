//! Domain engine of the recycling rewards service.
//!
//! The [`Engine`] owns the database connection and exposes every operation
//! of the service: profiles and authentication, the item catalog, the
//! session recorder, the points ledger, vouchers and analytics.

pub use analytics::{Analytics, AnalyticsRange, ExportRow, NamedValue, TrendPoint};
pub use error::EngineError;
pub use items::{Measurement, RecyclableItem};
pub use ops::{
    BasketItem, CentreTransaction, CentreTransactions, Engine, EngineBuilder, NewProfile,
    ProfileUpdate, Redeemed, VoucherDraft, VoucherUpdate,
};
pub use points_ledger::{LedgerEntry, LedgerSource, balance_of};
pub use profiles::{Profile, Role};
pub use recycling_transactions::RecyclingTransaction;
pub use sessions::RecyclingSession;
pub use vouchers::{RedemptionStatus, Voucher, VoucherRedemption};

mod analytics;
mod auth_tokens;
mod error;
mod items;
mod ops;
mod points_ledger;
mod profiles;
mod recycling_transactions;
mod sessions;
mod util;
mod vouchers;

type ResultEngine<T> = Result<T, EngineError>;
