use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{BalanceChange, EngineError, ResultEngine};

mod access;
mod card_invoices;
mod cards;
mod cost_centers;
mod fixed_movements;
mod movement_classes;
mod movements;
mod periods;
mod statistics;
mod wallets;

pub use fixed_movements::FixedMovementDraft;
pub use movements::{ApportionmentDraft, MovementDraft, MovementFilter, PaymentDraft};
pub use statistics::{DailyUse, PeriodSummary};

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

const BALANCE_EVENTS_CAPACITY: usize = 64;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    balance_events: broadcast::Sender<BalanceChange>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Subscribe to committed wallet balance changes.
    pub fn subscribe_balance_changes(&self) -> broadcast::Receiver<BalanceChange> {
        self.balance_events.subscribe()
    }

    /// Broadcast a committed balance change. Absent subscribers are fine.
    fn publish_balance_change(&self, change: BalanceChange) {
        let _ = self.balance_events.send(change);
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidValue(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.nfc().collect())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.nfc().collect())
}

/// Parses a stored UUID key, mapping garbage to a missing-key error.
fn parse_key(raw: &str, what: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(raw).map_err(|_| EngineError::KeyNotFound(format!("{what} not exists")))
}

/// Short display code for movements, derived from a fresh UUID.
///
/// Not a key: collisions are harmless, the code only shows up in logs and
/// in the wallet balance history.
fn next_movement_code() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    let n = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) % 1_000_000;
    format!("{n:06}")
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
        let (balance_events, _) = broadcast::channel(BALANCE_EVENTS_CAPACITY);
        Ok(Engine {
            database: self.database,
            balance_events,
        })
    }
}
