pub use apportionments::Apportionment;
pub use card_invoices::CardInvoice;
pub use cards::{Card, CardType};
pub use cost_centers::CostCenter;
pub use error::EngineError;
pub use events::{BalanceChange, BalanceChangeBuilder};
pub use financial_periods::FinancialPeriod;
pub use fixed_movements::{FixedMovement, FixedMovementState};
pub use launches::Launch;
pub use messages::MessageSource;
pub use money::MoneyCents;
pub use movement_classes::{ClassType, MovementClass};
pub use movements::{Movement, MovementState};
pub use ops::{
    ApportionmentDraft, DailyUse, Engine, EngineBuilder, FixedMovementDraft, MovementDraft,
    MovementFilter, PaymentDraft, PeriodSummary,
};
pub use paging::{Page, PageRequest};
pub use payments::{Payment, PaymentMethod};
pub use security::PasswordEncoder;
pub use users::User;
pub use wallet_balances::{BalanceType, WalletBalance};
pub use wallets::Wallet;

mod apportionments;
mod card_invoices;
mod cards;
mod cost_centers;
mod error;
mod events;
mod financial_periods;
mod fixed_movements;
mod launches;
mod messages;
mod money;
mod movement_classes;
mod movements;
mod ops;
mod paging;
mod payments;
mod security;
mod users;
mod wallet_balances;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
