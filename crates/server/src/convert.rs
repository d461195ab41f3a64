//! Conversions between engine types and the JSON types of `api_types`.

use api_types::{
    analytics as api_analytics, item as api_item, points as api_points, profile as api_profile,
    staff as api_staff, voucher as api_voucher,
};
use engine::{
    Analytics, CentreTransaction, LedgerEntry, LedgerSource, Measurement, Profile,
    RecyclableItem, RecyclingTransaction, Redeemed, Role, Voucher,
};

pub fn role_to_api(role: Role) -> api_profile::Role {
    match role {
        Role::Admin => api_profile::Role::Admin,
        Role::CentreStaff => api_profile::Role::CentreStaff,
        Role::Recycler => api_profile::Role::Recycler,
    }
}

pub fn role_from_api(role: api_profile::Role) -> Role {
    match role {
        api_profile::Role::Admin => Role::Admin,
        api_profile::Role::CentreStaff => Role::CentreStaff,
        api_profile::Role::Recycler => Role::Recycler,
    }
}

pub fn measurement_to_api(measurement: Measurement) -> api_item::Measurement {
    match measurement {
        Measurement::Count => api_item::Measurement::Count,
        Measurement::Weight => api_item::Measurement::Weight,
    }
}

pub fn measurement_from_api(measurement: api_item::Measurement) -> Measurement {
    match measurement {
        api_item::Measurement::Count => Measurement::Count,
        api_item::Measurement::Weight => Measurement::Weight,
    }
}

fn source_to_api(source: LedgerSource) -> api_points::LedgerSource {
    match source {
        LedgerSource::Recycling => api_points::LedgerSource::Recycling,
        LedgerSource::VoucherRedeem => api_points::LedgerSource::VoucherRedeem,
        LedgerSource::Adjustment => api_points::LedgerSource::Adjustment,
    }
}

pub fn profile_view(profile: Profile) -> api_profile::ProfileView {
    api_profile::ProfileView {
        id: profile.id,
        public_id: profile.public_id,
        full_name: profile.full_name,
        email: profile.email,
        role: role_to_api(profile.role),
        created_at: profile.created_at,
        updated_at: profile.updated_at,
    }
}

pub fn recycler_summary(profile: Profile) -> api_profile::RecyclerSummary {
    api_profile::RecyclerSummary {
        id: profile.id,
        public_id: profile.public_id,
        full_name: profile.full_name,
        role: role_to_api(profile.role),
    }
}

pub fn item_view(item: RecyclableItem) -> api_item::ItemView {
    api_item::ItemView {
        id: item.id,
        name: item.name,
        measurement: measurement_to_api(item.measurement),
    }
}

pub fn stored_transaction(tx: RecyclingTransaction) -> api_staff::StoredTransaction {
    api_staff::StoredTransaction {
        id: tx.id,
        session_id: tx.session_id,
        item_id: tx.item_id,
        quantity: tx.quantity,
        created_at: tx.created_at,
    }
}

pub fn transaction_view(row: CentreTransaction) -> api_staff::TransactionView {
    let tx = row.transaction;
    api_staff::TransactionView {
        id: tx.id,
        session_id: tx.session_id,
        recycler_id: tx.recycler_id,
        collection_centre_id: tx.collection_centre_id,
        item_id: tx.item_id,
        item_name: row.item_name,
        quantity: tx.quantity,
        display_quantity: row.display_quantity,
        created_at: tx.created_at,
        recycler: row.recycler.map(recycler_summary),
    }
}

pub fn ledger_entry_view(entry: LedgerEntry) -> api_points::LedgerEntryView {
    api_points::LedgerEntryView {
        id: entry.id,
        change: entry.change,
        source: source_to_api(entry.source),
        reason: entry.reason,
        created_at: entry.created_at,
    }
}

pub fn voucher_view(voucher: Voucher) -> api_voucher::VoucherView {
    api_voucher::VoucherView {
        id: voucher.id,
        name: voucher.name,
        description: voucher.description,
        points_cost: voucher.points_cost,
        is_active: voucher.is_active,
        created_at: voucher.created_at,
    }
}

pub fn redeemed_view(redeemed: Redeemed) -> api_voucher::Redeemed {
    let redemption = redeemed.redemption;
    api_voucher::Redeemed {
        redemption: api_voucher::RedemptionView {
            id: redemption.id,
            voucher_id: redemption.voucher_id,
            points_spent: redemption.points_spent,
            status: redemption.status.as_str().to_string(),
            created_at: redemption.created_at,
        },
        new_balance: redeemed.new_balance,
    }
}

pub fn analytics_response(range: &str, analytics: Analytics) -> api_analytics::AnalyticsResponse {
    let named = |values: Vec<engine::NamedValue>| -> Vec<api_analytics::NamedValue> {
        values
            .into_iter()
            .map(|value| api_analytics::NamedValue {
                name: value.name,
                value: value.value,
            })
            .collect()
    };

    api_analytics::AnalyticsResponse {
        range: range.to_string(),
        trend_data: analytics
            .trend
            .into_iter()
            .map(|point| api_analytics::TrendPoint {
                date: point.date,
                name: point.name,
                volume: point.volume,
                transactions: point.transactions,
            })
            .collect(),
        material_data: named(analytics.materials),
        centre_data: named(analytics.centres),
        export_data: analytics
            .rows
            .into_iter()
            .map(|row| api_analytics::ExportRow {
                id: row.id,
                date: row.date,
                material: row.material,
                centre: row.centre,
                quantity: row.quantity,
            })
            .collect(),
    }
}
