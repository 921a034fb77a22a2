//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for Bilancio:
//!
//! - `users`: authentication
//! - `cost_centers`: hierarchical budget groups with directional ceilings
//! - `movement_classes`: revenue/expense classes inside a cost center
//! - `financial_periods`: the accounting windows movements live in
//! - `wallets`: money locations with a running balance
//! - `wallet_balances`: immutable balance history, one row per change
//! - `cards`: credit and debit cards
//! - `payments`: how a movement was settled
//! - `fixed_movements`: recurring movement templates
//! - `movements`: the actual financial movements with their splits
//! - `apportionments`: value splits of a movement over classes
//! - `card_invoices`: credit card invoices grouping paid movements
//! - `launches`: quote history of fixed movement launches

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    DisplayName,
    Password,
    CreatedAt,
}

#[derive(Iden)]
enum CostCenters {
    Table,
    Id,
    Name,
    Description,
    ParentId,
    RevenuesBudget,
    ExpensesBudget,
    Blocked,
}

#[derive(Iden)]
enum MovementClasses {
    Table,
    Id,
    Name,
    ClassType,
    Budget,
    Blocked,
    CostCenterId,
}

#[derive(Iden)]
enum FinancialPeriods {
    Table,
    Id,
    Identification,
    StartsOn,
    EndsOn,
    Closed,
    ClosedAt,
}

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    Name,
    Description,
    Balance,
    Blocked,
}

#[derive(Iden)]
enum WalletBalances {
    Table,
    Id,
    WalletId,
    OldBalance,
    ActualBalance,
    MovedValue,
    BalanceType,
    MovementCode,
    Reason,
    RecordedAt,
}

#[derive(Iden)]
enum Cards {
    Table,
    Id,
    Name,
    CardType,
    Flag,
    WalletId,
    Blocked,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    PaidOn,
    Method,
    WalletId,
    CardId,
}

#[derive(Iden)]
enum FixedMovements {
    Table,
    Id,
    Identification,
    Description,
    Value,
    Installments,
    AutoLaunch,
    State,
    CreatedAt,
}

#[derive(Iden)]
enum Movements {
    Table,
    Id,
    Code,
    Description,
    Value,
    DueDate,
    State,
    FinancialPeriodId,
    PaymentId,
    CardInvoiceId,
    CardInvoicePaid,
    CreatedAt,
}

#[derive(Iden)]
enum Apportionments {
    Table,
    Id,
    Value,
    MovementId,
    FixedMovementId,
    MovementClassId,
}

#[derive(Iden)]
enum CardInvoices {
    Table,
    Id,
    Identification,
    Total,
    CardId,
    FinancialPeriodId,
    MovementId,
}

#[derive(Iden)]
enum Launches {
    Table,
    Id,
    QuoteNumber,
    FixedMovementId,
    MovementId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Cost centers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CostCenters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CostCenters::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CostCenters::Name).string().not_null())
                    .col(ColumnDef::new(CostCenters::Description).string())
                    .col(ColumnDef::new(CostCenters::ParentId).string())
                    .col(
                        ColumnDef::new(CostCenters::RevenuesBudget)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CostCenters::ExpensesBudget)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CostCenters::Blocked).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cost_centers-parent_id")
                            .from(CostCenters::Table, CostCenters::ParentId)
                            .to(CostCenters::Table, CostCenters::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cost_centers-parent_id-name-unique")
                    .table(CostCenters::Table)
                    .col(CostCenters::ParentId)
                    .col(CostCenters::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Movement classes
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MovementClasses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MovementClasses::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MovementClasses::Name).string().not_null())
                    .col(
                        ColumnDef::new(MovementClasses::ClassType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MovementClasses::Budget)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MovementClasses::Blocked)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MovementClasses::CostCenterId)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movement_classes-cost_center_id")
                            .from(MovementClasses::Table, MovementClasses::CostCenterId)
                            .to(CostCenters::Table, CostCenters::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movement_classes-cost_center_id-name-class_type-unique")
                    .table(MovementClasses::Table)
                    .col(MovementClasses::CostCenterId)
                    .col(MovementClasses::Name)
                    .col(MovementClasses::ClassType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Financial periods
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FinancialPeriods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinancialPeriods::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FinancialPeriods::Identification)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FinancialPeriods::StartsOn).date().not_null())
                    .col(ColumnDef::new(FinancialPeriods::EndsOn).date().not_null())
                    .col(ColumnDef::new(FinancialPeriods::Closed).boolean().not_null())
                    .col(ColumnDef::new(FinancialPeriods::ClosedAt).timestamp())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-financial_periods-identification-unique")
                    .table(FinancialPeriods::Table)
                    .col(FinancialPeriods::Identification)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Wallets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wallets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Wallets::Name).string().not_null())
                    .col(ColumnDef::new(Wallets::Description).string())
                    .col(ColumnDef::new(Wallets::Balance).big_integer().not_null())
                    .col(ColumnDef::new(Wallets::Blocked).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallets-name-unique")
                    .table(Wallets::Table)
                    .col(Wallets::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Wallet balances
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(WalletBalances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletBalances::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WalletBalances::WalletId).string().not_null())
                    .col(
                        ColumnDef::new(WalletBalances::OldBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletBalances::ActualBalance)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletBalances::MovedValue)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletBalances::BalanceType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletBalances::MovementCode).string())
                    .col(ColumnDef::new(WalletBalances::Reason).string())
                    .col(
                        ColumnDef::new(WalletBalances::RecordedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallet_balances-wallet_id")
                            .from(WalletBalances::Table, WalletBalances::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_balances-wallet_id-recorded_at")
                    .table(WalletBalances::Table)
                    .col(WalletBalances::WalletId)
                    .col(WalletBalances::RecordedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Cards
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Cards::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cards::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Cards::Name).string().not_null())
                    .col(ColumnDef::new(Cards::CardType).string().not_null())
                    .col(ColumnDef::new(Cards::Flag).string())
                    .col(ColumnDef::new(Cards::WalletId).string())
                    .col(ColumnDef::new(Cards::Blocked).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cards-wallet_id")
                            .from(Cards::Table, Cards::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cards-name-card_type-unique")
                    .table(Cards::Table)
                    .col(Cards::Name)
                    .col(Cards::CardType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::PaidOn).date().not_null())
                    .col(ColumnDef::new(Payments::Method).string().not_null())
                    .col(ColumnDef::new(Payments::WalletId).string())
                    .col(ColumnDef::new(Payments::CardId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-wallet_id")
                            .from(Payments::Table, Payments::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payments-card_id")
                            .from(Payments::Table, Payments::CardId)
                            .to(Cards::Table, Cards::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Fixed movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FixedMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FixedMovements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FixedMovements::Identification)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FixedMovements::Description)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FixedMovements::Value)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FixedMovements::Installments).integer())
                    .col(
                        ColumnDef::new(FixedMovements::AutoLaunch)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FixedMovements::State).string().not_null())
                    .col(
                        ColumnDef::new(FixedMovements::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Movements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Movements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Movements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Movements::Code).string().not_null())
                    .col(ColumnDef::new(Movements::Description).string().not_null())
                    .col(ColumnDef::new(Movements::Value).big_integer().not_null())
                    .col(ColumnDef::new(Movements::DueDate).date().not_null())
                    .col(ColumnDef::new(Movements::State).string().not_null())
                    .col(
                        ColumnDef::new(Movements::FinancialPeriodId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::PaymentId).string())
                    .col(ColumnDef::new(Movements::CardInvoiceId).string())
                    .col(
                        ColumnDef::new(Movements::CardInvoicePaid)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Movements::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-financial_period_id")
                            .from(Movements::Table, Movements::FinancialPeriodId)
                            .to(FinancialPeriods::Table, FinancialPeriods::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-payment_id")
                            .from(Movements::Table, Movements::PaymentId)
                            .to(Payments::Table, Payments::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-movements-card_invoice_id")
                            .from(Movements::Table, Movements::CardInvoiceId)
                            .to(CardInvoices::Table, CardInvoices::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-code-unique")
                    .table(Movements::Table)
                    .col(Movements::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-movements-financial_period_id-due_date")
                    .table(Movements::Table)
                    .col(Movements::FinancialPeriodId)
                    .col(Movements::DueDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 11. Apportionments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Apportionments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Apportionments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Apportionments::Value)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Apportionments::MovementId).string())
                    .col(ColumnDef::new(Apportionments::FixedMovementId).string())
                    .col(
                        ColumnDef::new(Apportionments::MovementClassId)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-apportionments-movement_id")
                            .from(Apportionments::Table, Apportionments::MovementId)
                            .to(Movements::Table, Movements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-apportionments-fixed_movement_id")
                            .from(Apportionments::Table, Apportionments::FixedMovementId)
                            .to(FixedMovements::Table, FixedMovements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-apportionments-movement_class_id")
                            .from(Apportionments::Table, Apportionments::MovementClassId)
                            .to(MovementClasses::Table, MovementClasses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-apportionments-movement_id")
                    .table(Apportionments::Table)
                    .col(Apportionments::MovementId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-apportionments-fixed_movement_id")
                    .table(Apportionments::Table)
                    .col(Apportionments::FixedMovementId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 12. Card invoices
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CardInvoices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CardInvoices::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CardInvoices::Identification)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CardInvoices::Total).big_integer().not_null())
                    .col(ColumnDef::new(CardInvoices::CardId).string().not_null())
                    .col(
                        ColumnDef::new(CardInvoices::FinancialPeriodId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CardInvoices::MovementId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-card_invoices-card_id")
                            .from(CardInvoices::Table, CardInvoices::CardId)
                            .to(Cards::Table, Cards::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-card_invoices-financial_period_id")
                            .from(CardInvoices::Table, CardInvoices::FinancialPeriodId)
                            .to(FinancialPeriods::Table, FinancialPeriods::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-card_invoices-movement_id")
                            .from(CardInvoices::Table, CardInvoices::MovementId)
                            .to(Movements::Table, Movements::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-card_invoices-card_id-financial_period_id-unique")
                    .table(CardInvoices::Table)
                    .col(CardInvoices::CardId)
                    .col(CardInvoices::FinancialPeriodId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 13. Launches
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Launches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Launches::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Launches::QuoteNumber).integer().not_null())
                    .col(
                        ColumnDef::new(Launches::FixedMovementId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Launches::MovementId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-launches-fixed_movement_id")
                            .from(Launches::Table, Launches::FixedMovementId)
                            .to(FixedMovements::Table, FixedMovements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-launches-movement_id")
                            .from(Launches::Table, Launches::MovementId)
                            .to(Movements::Table, Movements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-launches-fixed_movement_id-quote_number-unique")
                    .table(Launches::Table)
                    .col(Launches::FixedMovementId)
                    .col(Launches::QuoteNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Launches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CardInvoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Apportionments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Movements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FixedMovements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletBalances::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FinancialPeriods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MovementClasses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CostCenters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
