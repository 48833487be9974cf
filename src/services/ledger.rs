//! Append-only purchase ledger.

use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;

use super::errors::ServiceError;
use crate::db::models::{HistoryEntry, Money, PurchaseAction, PurchaseEvent, PurchasedMedicine};

/// Ledger row about to be written. `total_price` is derived, never supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchase {
    pub user_id: i64,
    pub medicine_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub timestamp: DateTime<Utc>,
}

impl NewPurchase {
    pub fn total_price(&self) -> Result<Money, ServiceError> {
        self.unit_price
            .checked_mul(self.quantity)
            .ok_or_else(|| ServiceError::invalid("Order total is too large"))
    }
}

/// Writes one purchase event. Callers run this inside the transaction that
/// decrements stock.
pub async fn append<'e, E>(executor: E, purchase: &NewPurchase) -> Result<PurchaseEvent, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    let total_price = purchase.total_price()?;

    let event = sqlx::query_as::<_, PurchaseEvent>(
        "INSERT INTO purchase_history \
         (user_id, medicine_id, action, quantity, unit_price_cents, total_price_cents, timestamp) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         RETURNING id, user_id, medicine_id, action, quantity, unit_price_cents, total_price_cents, timestamp",
    )
    .bind(purchase.user_id)
    .bind(purchase.medicine_id)
    .bind(PurchaseAction::Purchase)
    .bind(purchase.quantity)
    .bind(purchase.unit_price)
    .bind(total_price)
    .bind(purchase.timestamp)
    .fetch_one(executor)
    .await?;

    Ok(event)
}

/// Every purchase of `user_id`, newest first.
pub async fn history<'e, E>(executor: E, user_id: i64) -> Result<Vec<HistoryEntry>, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    let entries = sqlx::query_as::<_, HistoryEntry>(
        "SELECT ph.id AS purchase_id, m.id, m.name, m.uses, m.stock, m.price_cents, \
                ph.quantity, ph.unit_price_cents, ph.total_price_cents, ph.timestamp AS purchased_at \
         FROM purchase_history ph \
         JOIN medicines m ON m.id = ph.medicine_id \
         WHERE ph.user_id = ?1 AND ph.action = 'purchase' \
         ORDER BY ph.timestamp DESC, ph.id DESC",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(entries)
}

/// Medicines bought by `user_id`, one row per purchase event, newest first.
/// A medicine bought twice appears twice.
pub async fn purchased_medicines<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Vec<PurchasedMedicine>, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    let purchased = sqlx::query_as::<_, PurchasedMedicine>(
        "SELECT m.id, m.name, m.uses, m.stock, m.price_cents, ph.timestamp AS purchased_at \
         FROM purchase_history ph \
         JOIN medicines m ON m.id = ph.medicine_id \
         WHERE ph.user_id = ?1 AND ph.action = 'purchase' \
         ORDER BY ph.timestamp DESC, ph.id DESC",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(purchased)
}
