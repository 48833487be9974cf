//! Recommendation and inventory-transaction engine.
//!
//! [`Pharmacy`] is the entry point for every request. It is cheap to clone and
//! holds nothing but the connection pool; all context travels as arguments.

use sqlx::SqlitePool;

pub mod alerts;
pub mod catalog;
pub mod errors;
pub mod input;
pub mod ledger;
pub mod purchases;
pub mod recommendations;
pub mod substitutes;
pub mod users;

pub use errors::{ErrorBody, ErrorKind, ServiceError, StockShortage};
pub use input::{PurchaseRequest, Quantity, Username};
pub use purchases::PurchaseReceipt;
pub use recommendations::Recommendations;

use crate::db::models::{HistoryEntry, Medicine, MedicineProfile};

#[derive(Debug, Clone)]
pub struct Pharmacy {
    pool: SqlitePool,
}

impl Pharmacy {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Resolves (or registers) `username` and returns history, collaborative
    /// suggestions and top-sellers.
    pub async fn recommend(&self, username: &str) -> Result<Recommendations, ServiceError> {
        let username = Username::parse(username)?;
        let user = users::resolve(&self.pool, &username).await?;

        recommendations::recommend(&self.pool, user).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Medicine>, ServiceError> {
        catalog::search(&self.pool, query).await
    }

    pub async fn purchase(
        &self,
        username: &str,
        medicine_id: i64,
        quantity: i64,
    ) -> Result<PurchaseReceipt, ServiceError> {
        purchases::purchase(&self.pool, username, medicine_id, quantity).await
    }

    /// Full purchase log of an existing user. Unknown users are `NotFound`.
    pub async fn history(&self, username: &str) -> Result<Vec<HistoryEntry>, ServiceError> {
        let username = Username::parse(username)?;
        let user_id = users::lookup(&self.pool, &username)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        ledger::history(&self.pool, user_id).await
    }

    pub async fn substitutes(&self, medicine_id: i64) -> Result<Vec<Medicine>, ServiceError> {
        substitutes::substitutes(&self.pool, medicine_id).await
    }

    pub async fn medicine(&self, medicine_id: i64) -> Result<MedicineProfile, ServiceError> {
        catalog::profile(&self.pool, medicine_id).await
    }
}
