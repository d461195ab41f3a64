use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `?id=` query of admin deletes keyed by a string id.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdQuery {
    pub id: String,
}

pub mod profile {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Admin,
        CentreStaff,
        Recycler,
    }

    impl Role {
        /// Returns the canonical role string used by the engine/database.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Admin => "admin",
                Self::CentreStaff => "centre_staff",
                Self::Recycler => "recycler",
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProfileView {
        pub id: String,
        pub public_id: String,
        pub full_name: Option<String>,
        pub email: String,
        pub role: Role,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// What centre staff see of a recycler.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RecyclerSummary {
        pub id: String,
        pub public_id: String,
        pub full_name: Option<String>,
        pub role: Role,
    }

    /// Response of `GET /api/me`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Me {
        pub user: MeView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MeView {
        pub id: String,
        pub full_name: Option<String>,
        pub role: Role,
        pub public_id: String,
        pub email: String,
        pub points_total: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserNew {
        pub email: String,
        pub password: Option<String>,
        pub full_name: Option<String>,
        pub role: Role,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserUpdate {
        pub id: String,
        pub email: Option<String>,
        pub full_name: Option<String>,
        pub role: Option<Role>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserListQuery {
        pub role: Option<Role>,
    }
}

pub mod auth {
    use super::*;
    use crate::profile::ProfileView;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub token: String,
        pub profile: ProfileView,
    }

    /// Self-registration. The created profile is always a recycler.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Register {
        pub email: String,
        pub password: String,
        pub full_name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Success {
        pub success: bool,
    }
}

pub mod item {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Measurement {
        Count,
        Weight,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemView {
        pub id: i32,
        pub name: String,
        pub measurement: Measurement,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemNew {
        pub name: String,
        /// Defaults to `count`.
        pub measurement: Option<Measurement>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemUpdate {
        pub id: i32,
        pub name: Option<String>,
        pub measurement: Option<Measurement>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemIdQuery {
        pub id: i32,
    }
}

pub mod staff {
    use super::*;
    use crate::profile::RecyclerSummary;

    /// One basket line. `quantity` is in kg for weight items, pieces otherwise.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BasketLine {
        pub item_id: i32,
        pub quantity: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SessionNew {
        pub recycler_id: String,
        pub items: Vec<BasketLine>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SessionCreated {
        pub success: bool,
        pub session_id: String,
        pub message: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionUpdate {
        pub items: Vec<BasketLine>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionUpdated {
        pub success: bool,
        pub transactions: Vec<StoredTransaction>,
    }

    /// A transaction as persisted: `quantity` in grams for weight items.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StoredTransaction {
        pub id: String,
        pub session_id: String,
        pub item_id: i32,
        pub quantity: i64,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionListQuery {
        pub recycler_id: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionView {
        pub id: String,
        pub session_id: String,
        pub recycler_id: String,
        pub collection_centre_id: String,
        pub item_id: i32,
        pub item_name: String,
        pub quantity: i64,
        pub display_quantity: f64,
        pub created_at: DateTime<Utc>,
        pub recycler: Option<RecyclerSummary>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub centre_totals: BTreeMap<String, f64>,
        pub recycler_totals: Option<BTreeMap<String, f64>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LookupRecycler {
        pub member_code: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LookupResponse {
        pub profile: RecyclerSummary,
    }
}

pub mod points {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LedgerSource {
        Recycling,
        VoucherRedeem,
        Adjustment,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LedgerEntryView {
        pub id: i64,
        pub change: i64,
        pub source: LedgerSource,
        pub reason: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    /// Response of `GET /api/points/me`, entries newest first.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PointsResponse {
        pub total_points: i64,
        pub entries: Vec<LedgerEntryView>,
    }
}

pub mod voucher {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VoucherView {
        pub id: String,
        pub name: String,
        pub description: Option<String>,
        pub points_cost: i64,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VoucherNew {
        pub name: String,
        pub description: Option<String>,
        pub points_cost: i64,
        /// Defaults to `true`.
        pub is_active: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VoucherUpdate {
        pub id: String,
        pub name: Option<String>,
        pub description: Option<String>,
        pub points_cost: Option<i64>,
        pub is_active: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Redeem {
        pub voucher_id: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RedemptionView {
        pub id: String,
        pub voucher_id: String,
        pub points_spent: i64,
        pub status: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Redeemed {
        pub redemption: RedemptionView,
        pub new_balance: i64,
    }
}

pub mod analytics {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AnalyticsQuery {
        /// `7d` (default), `30d` or `all`.
        pub range: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TrendPoint {
        pub date: NaiveDate,
        pub name: String,
        pub volume: i64,
        pub transactions: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NamedValue {
        pub name: String,
        pub value: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExportRow {
        pub id: String,
        pub date: DateTime<Utc>,
        pub material: String,
        pub centre: String,
        pub quantity: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AnalyticsResponse {
        pub range: String,
        pub trend_data: Vec<TrendPoint>,
        pub material_data: Vec<NamedValue>,
        pub centre_data: Vec<NamedValue>,
        pub export_data: Vec<ExportRow>,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Health {
        pub ok: bool,
        pub database_connected: bool,
    }
}
