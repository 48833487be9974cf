use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Amount of money in minor units (cents).
#[derive(
    sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord,
)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Price of `quantity` units, `None` on overflow.
    pub fn checked_mul(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, cents / 100, cents % 100)
    }
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub uses: String,
    pub stock: i64,
    #[sqlx(rename = "price_cents")]
    #[serde(rename = "price_cents")]
    pub price: Money,
}

impl Medicine {
    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }
}

/// Catalog row plus the descriptive columns carried over from the source dataset.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MedicineProfile {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub medicine: Medicine,
    pub chemical_class: Option<String>,
    pub therapeutic_class: Option<String>,
    pub action_class: Option<String>,
    pub habit_forming: Option<String>,
    pub side_effects: Option<String>,
}

/// A medicine together with the number of purchase events that ranked it.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RankedMedicine {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub medicine: Medicine,
    pub frequency: i64,
}

/// One purchase event of the user, seen through the medicine's current catalog row.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PurchasedMedicine {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub medicine: Medicine,
    pub purchased_at: DateTime<Utc>,
}

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseAction {
    Purchase,
}

/// Immutable ledger row.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PurchaseEvent {
    pub id: i64,
    pub user_id: i64,
    pub medicine_id: i64,
    pub action: PurchaseAction,
    pub quantity: i64,
    #[sqlx(rename = "unit_price_cents")]
    #[serde(rename = "unit_price_cents")]
    pub unit_price: Money,
    #[sqlx(rename = "total_price_cents")]
    #[serde(rename = "total_price_cents")]
    pub total_price: Money,
    pub timestamp: DateTime<Utc>,
}

/// One ledger event joined with the current catalog row of its medicine.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub purchase_id: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub medicine: Medicine,
    pub quantity: i64,
    #[sqlx(rename = "unit_price_cents")]
    #[serde(rename = "unit_price_cents")]
    pub unit_price: Money,
    #[sqlx(rename = "total_price_cents")]
    #[serde(rename = "total_price_cents")]
    pub total_price: Money,
    pub purchased_at: DateTime<Utc>,
}
