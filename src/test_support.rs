//! Test context for service-level tests against an in-memory store.

use std::str::FromStr;

use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    db::{
        apply_schema,
        models::{Medicine, Money},
    },
    services::{
        ledger::{self, NewPurchase},
        Pharmacy,
    },
};

pub struct TestContext {
    pub pool: SqlitePool,
    pub pharmacy: Pharmacy,
}

impl TestContext {
    /// Fresh schema in a private in-memory database.
    ///
    /// An in-memory SQLite database lives and dies with its connection, so the
    /// pool is pinned to exactly one connection that is never recycled.
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("in-memory options")
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .expect("Failed to open in-memory database");

        apply_schema(&pool).await.expect("Failed to apply schema");

        Self {
            pharmacy: Pharmacy::new(pool.clone()),
            pool,
        }
    }

    pub async fn add_medicine(
        &self,
        id: i64,
        name: &str,
        uses: &str,
        stock: i64,
        price_cents: i64,
    ) -> Medicine {
        sqlx::query_as::<_, Medicine>(
            "INSERT INTO medicines (id, name, uses, stock, price_cents) VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING id, name, uses, stock, price_cents",
        )
        .bind(id)
        .bind(name)
        .bind(uses)
        .bind(stock)
        .bind(price_cents)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert medicine")
    }

    pub async fn add_user(&self, username: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO users (username) VALUES (?1) RETURNING id")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to insert user")
    }

    /// Ledger-only purchase at the medicine's current price; stock is untouched.
    pub async fn record_purchase(&self, user_id: i64, medicine_id: i64, quantity: i64) {
        let price: Money = sqlx::query_scalar("SELECT price_cents FROM medicines WHERE id = ?1")
            .bind(medicine_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to read price");

        ledger::append(
            &self.pool,
            &NewPurchase {
                user_id,
                medicine_id,
                quantity,
                unit_price: price,
                timestamp: Utc::now(),
            },
        )
        .await
        .expect("Failed to record purchase");
    }

    pub async fn stock_of(&self, medicine_id: i64) -> i64 {
        sqlx::query_scalar("SELECT stock FROM medicines WHERE id = ?1")
            .bind(medicine_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to read stock")
    }

    pub async fn set_price(&self, medicine_id: i64, price_cents: i64) {
        sqlx::query("UPDATE medicines SET price_cents = ?1 WHERE id = ?2")
            .bind(price_cents)
            .bind(medicine_id)
            .execute(&self.pool)
            .await
            .expect("Failed to update price");
    }
}
