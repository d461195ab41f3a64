//! Initial schema of the recycling rewards service.
//!
//! - `profiles`: people with a role (`admin`, `centre_staff`, `recycler`)
//! - `auth_tokens`: fingerprints of issued bearer tokens
//! - `recyclable_items`: the item catalog
//! - `recycling_sessions`: one visit recorded by a collection centre
//! - `recycling_transactions`: one item line of a session
//! - `points_ledger`: append-only point changes
//! - `vouchers` / `voucher_redemptions`: rewards and their redemptions

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Profiles {
    Table,
    Id,
    Role,
    PublicId,
    FullName,
    Email,
    PasswordHash,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum AuthTokens {
    Table,
    TokenHash,
    ProfileId,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum RecyclableItems {
    Table,
    Id,
    Name,
    NameNorm,
    Measurement,
}

#[derive(Iden)]
enum RecyclingSessions {
    Table,
    Id,
    RecyclerId,
    CollectionCentreId,
    CreatedAt,
}

#[derive(Iden)]
enum RecyclingTransactions {
    Table,
    Id,
    SessionId,
    RecyclerId,
    CollectionCentreId,
    ItemId,
    Quantity,
    CreatedAt,
}

#[derive(Iden)]
enum PointsLedger {
    Table,
    Id,
    UserId,
    Change,
    Source,
    Reason,
    CreatedAt,
}

#[derive(Iden)]
enum Vouchers {
    Table,
    Id,
    Name,
    Description,
    PointsCost,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum VoucherRedemptions {
    Table,
    Id,
    UserId,
    VoucherId,
    PointsSpent,
    Status,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Profiles
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Profiles::Id).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Profiles::Role)
                            .string()
                            .not_null()
                            .default("recycler"),
                    )
                    .col(
                        ColumnDef::new(Profiles::PublicId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Profiles::FullName).string())
                    .col(ColumnDef::new(Profiles::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Profiles::PasswordHash).string())
                    .col(
                        ColumnDef::new(Profiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Profiles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-profiles-role")
                    .table(Profiles::Table)
                    .col(Profiles::Role)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Auth tokens
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(AuthTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthTokens::TokenHash)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuthTokens::ProfileId).string().not_null())
                    .col(
                        ColumnDef::new(AuthTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-auth_tokens-profile_id")
                            .from(AuthTokens::Table, AuthTokens::ProfileId)
                            .to(Profiles::Table, Profiles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Recyclable items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(RecyclableItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecyclableItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RecyclableItems::Name).string().not_null())
                    .col(
                        ColumnDef::new(RecyclableItems::NameNorm)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(RecyclableItems::Measurement)
                            .string()
                            .not_null()
                            .default("count"),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Recycling sessions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(RecyclingSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecyclingSessions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RecyclingSessions::RecyclerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecyclingSessions::CollectionCentreId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecyclingSessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recycling_sessions-recycler_id")
                            .from(RecyclingSessions::Table, RecyclingSessions::RecyclerId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recycling_sessions-collection_centre_id")
                            .from(
                                RecyclingSessions::Table,
                                RecyclingSessions::CollectionCentreId,
                            )
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Recycling transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(RecyclingTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecyclingTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RecyclingTransactions::SessionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecyclingTransactions::RecyclerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecyclingTransactions::CollectionCentreId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecyclingTransactions::ItemId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecyclingTransactions::Quantity)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RecyclingTransactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recycling_transactions-session_id")
                            .from(
                                RecyclingTransactions::Table,
                                RecyclingTransactions::SessionId,
                            )
                            .to(RecyclingSessions::Table, RecyclingSessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recycling_transactions-item_id")
                            .from(RecyclingTransactions::Table, RecyclingTransactions::ItemId)
                            .to(RecyclableItems::Table, RecyclableItems::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-recycling_transactions-session_id")
                    .table(RecyclingTransactions::Table)
                    .col(RecyclingTransactions::SessionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-recycling_transactions-centre-created_at")
                    .table(RecyclingTransactions::Table)
                    .col(RecyclingTransactions::CollectionCentreId)
                    .col(RecyclingTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-recycling_transactions-created_at")
                    .table(RecyclingTransactions::Table)
                    .col(RecyclingTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Points ledger
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PointsLedger::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PointsLedger::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PointsLedger::UserId).string().not_null())
                    .col(ColumnDef::new(PointsLedger::Change).big_integer().not_null())
                    .col(ColumnDef::new(PointsLedger::Source).string().not_null())
                    .col(ColumnDef::new(PointsLedger::Reason).string())
                    .col(
                        ColumnDef::new(PointsLedger::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-points_ledger-user_id")
                            .from(PointsLedger::Table, PointsLedger::UserId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-points_ledger-user_id")
                    .table(PointsLedger::Table)
                    .col(PointsLedger::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Vouchers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Vouchers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vouchers::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Vouchers::Name).string().not_null())
                    .col(ColumnDef::new(Vouchers::Description).string())
                    .col(ColumnDef::new(Vouchers::PointsCost).big_integer().not_null())
                    .col(
                        ColumnDef::new(Vouchers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Vouchers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Voucher redemptions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(VoucherRedemptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VoucherRedemptions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VoucherRedemptions::UserId).string().not_null())
                    .col(
                        ColumnDef::new(VoucherRedemptions::VoucherId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VoucherRedemptions::PointsSpent)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VoucherRedemptions::Status)
                            .string()
                            .not_null()
                            .default("redeemed"),
                    )
                    .col(
                        ColumnDef::new(VoucherRedemptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-voucher_redemptions-user_id")
                            .from(VoucherRedemptions::Table, VoucherRedemptions::UserId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-voucher_redemptions-voucher_id")
                            .from(VoucherRedemptions::Table, VoucherRedemptions::VoucherId)
                            .to(Vouchers::Table, Vouchers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-voucher_redemptions-user_id")
                    .table(VoucherRedemptions::Table)
                    .col(VoucherRedemptions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VoucherRedemptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vouchers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PointsLedger::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecyclingTransactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecyclingSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecyclableItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        Ok(())
    }
}
