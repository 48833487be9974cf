//! Transaction processor: validated, atomic, stock-decrementing purchases.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use super::{
    catalog,
    errors::{ServiceError, StockShortage},
    input::{Quantity, Username},
    ledger::{self, NewPurchase},
    substitutes,
    users::{self, ResolvedUser},
};
use crate::db::models::{Medicine, Money};

/// Lifecycle of one purchase request. `Committed` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStage {
    Validating,
    UserResolved,
    StockChecked,
    Committed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    pub message: String,
    pub purchase_id: i64,
    pub user_id: i64,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    /// Stock read back after commit.
    pub stock: i64,
    pub purchased_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct Decremented {
    name: String,
    price_cents: Money,
}

/// Sells `quantity` units of `medicine_id` to `username`.
///
/// Parameters:
/// - `pool`: Store holding the catalog, users and ledger.
/// - `username`: The buyer, registered on first contact.
/// - `medicine_id`: Catalog id of the medicine to sell.
/// - `quantity`: Units to sell, must be positive.
///
/// Returns:
/// - `Ok(PurchaseReceipt)` once the ledger event and the stock decrement are committed.
/// - `Err(ServiceError::InsufficientStock)` with up to five substitutes when the shelf is short.
/// - `Err(ServiceError)` of another kind for bad input, unknown medicines or storage failures.
///
/// The stock check happens twice: once against a plain read for a fast,
/// side-effect-free rejection, and again inside the write transaction as
/// `UPDATE … WHERE stock >= ?`. Only the second one is authoritative; if a
/// concurrent purchase drained the shelf in between, the update touches no row,
/// the transaction rolls back and the caller gets `InsufficientStock`.
pub async fn purchase(
    pool: &SqlitePool,
    username: &str,
    medicine_id: i64,
    quantity: i64,
) -> Result<PurchaseReceipt, ServiceError> {
    let mut stage = PurchaseStage::Validating;

    let result = run(pool, username, medicine_id, quantity, &mut stage).await;

    match &result {
        Ok(receipt) => log::info!(
            "Purchase {} committed: {} x{} of medicine {} (stock now {})",
            receipt.purchase_id,
            username,
            receipt.quantity,
            receipt.medicine_id,
            receipt.stock
        ),
        Err(e) => {
            let failed_at = stage;
            advance(&mut stage, PurchaseStage::Rejected);
            log::warn!(
                "Purchase of medicine {} by {} rejected at {:?}: {}",
                medicine_id,
                username,
                failed_at,
                e
            );
        }
    }

    result
}

async fn run(
    pool: &SqlitePool,
    username: &str,
    medicine_id: i64,
    quantity: i64,
    stage: &mut PurchaseStage,
) -> Result<PurchaseReceipt, ServiceError> {
    let quantity = Quantity::try_from(quantity)?;
    let username = Username::parse(username)?;

    let user = users::resolve(pool, &username).await?;
    advance(stage, PurchaseStage::UserResolved);

    let medicine = catalog::require(pool, medicine_id).await?;
    if medicine.stock < quantity.get() {
        return Err(shortage(pool, medicine, quantity).await);
    }
    advance(stage, PurchaseStage::StockChecked);

    let receipt = commit(pool, user, &username, medicine, quantity).await?;
    advance(stage, PurchaseStage::Committed);

    Ok(receipt)
}

/// Decrements stock and appends the ledger event in one transaction.
///
/// `medicine` is the row read during the pre-check and may be stale by now;
/// the conditional update decides. When it touches no row the transaction is
/// rolled back and the shortage reports the stock as it is after the rollback.
async fn commit(
    pool: &SqlitePool,
    user: ResolvedUser,
    username: &Username,
    medicine: Medicine,
    quantity: Quantity,
) -> Result<PurchaseReceipt, ServiceError> {
    let medicine_id = medicine.id;
    let mut tx = pool.begin().await?;

    let decremented = sqlx::query_as::<_, Decremented>(
        "UPDATE medicines SET stock = stock - ?1 \
         WHERE id = ?2 AND stock >= ?1 \
         RETURNING name, price_cents",
    )
    .bind(quantity.get())
    .bind(medicine_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(decremented) = decremented else {
        tx.rollback().await?;
        let stock = catalog::current_stock(pool, medicine_id).await?;
        log::debug!(
            "Medicine {} drained by a concurrent purchase, {} left",
            medicine_id,
            stock
        );
        return Err(shortage(pool, Medicine { stock, ..medicine }, quantity).await);
    };

    let event = ledger::append(
        &mut *tx,
        &NewPurchase {
            user_id: user.user_id,
            medicine_id,
            quantity: quantity.get(),
            unit_price: decremented.price_cents,
            timestamp: Utc::now(),
        },
    )
    .await?;

    tx.commit().await?;

    let stock = catalog::current_stock(pool, medicine_id).await?;

    Ok(PurchaseReceipt {
        message: format!(
            "Medicine '{}' purchased successfully by {} (Quantity: {})!",
            decremented.name,
            username.as_str(),
            quantity.get()
        ),
        purchase_id: event.id,
        user_id: user.user_id,
        medicine_id,
        medicine_name: decremented.name,
        quantity: event.quantity,
        unit_price: event.unit_price,
        total_price: event.total_price,
        stock,
        purchased_at: event.timestamp,
    })
}

/// Builds the rejection for `medicine`, attaching substitutes as the fallback.
/// A failing substitute lookup wins over the shortage so storage problems are
/// never masked.
async fn shortage(pool: &SqlitePool, medicine: Medicine, quantity: Quantity) -> ServiceError {
    let substitutes = match substitutes::substitutes_for(pool, &medicine).await {
        Ok(substitutes) => substitutes,
        Err(e) => return e,
    };

    ServiceError::InsufficientStock(Box::new(StockShortage {
        medicine_id: medicine.id,
        name: medicine.name,
        available: medicine.stock,
        requested: quantity.get(),
        substitutes,
    }))
}

fn advance(stage: &mut PurchaseStage, next: PurchaseStage) {
    log::debug!("Purchase stage {:?} -> {:?}", stage, next);
    *stage = next;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::db::models::PurchaseEvent;

    use crate::test_support::TestContext;

    async fn ledger_rows(ctx: &TestContext) -> Vec<PurchaseEvent> {
        sqlx::query_as::<_, PurchaseEvent>("SELECT * FROM purchase_history ORDER BY id")
            .fetch_all(&ctx.pool)
            .await
            .expect("read ledger")
    }

    #[tokio::test]
    async fn paracetamol_example() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(7, "Paracetamol", "Pain relief", 10, 500).await;

        let receipt = purchase(&ctx.pool, "alice", 7, 3).await?;

        assert_eq!(receipt.stock, 7);
        assert_eq!(receipt.quantity, 3);
        assert_eq!(receipt.total_price, Money::from_cents(1500));
        assert_eq!(receipt.medicine_name, "Paracetamol");
        assert_eq!(
            receipt.message,
            "Medicine 'Paracetamol' purchased successfully by alice (Quantity: 3)!"
        );

        let err = purchase(&ctx.pool, "alice", 7, 8).await.unwrap_err();

        assert!(err.to_string().starts_with("Only 7 units"));
        assert!(err.to_string().contains("Paracetamol"));
        assert_eq!(ctx.stock_of(7).await, 7);

        let rows = ledger_rows(&ctx).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 3);
        assert_eq!(rows[0].total_price, Money::from_cents(1500));

        Ok(())
    }

    #[tokio::test]
    async fn insufficient_stock_leaves_everything_untouched() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Ibuprofen", "Pain relief", 2, 800).await;

        let err = purchase(&ctx.pool, "bob", 1, 3).await.unwrap_err();

        match err {
            ServiceError::InsufficientStock(shortage) => {
                assert_eq!(shortage.available, 2);
                assert_eq!(shortage.requested, 3);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
        assert_eq!(ctx.stock_of(1).await, 2);
        assert!(ledger_rows(&ctx).await.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn shortage_offers_substitutes() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Paracetamol", "Pain relief", 0, 500).await;
        ctx.add_medicine(2, "Ibuprofen", "Pain relief", 4, 800).await;
        ctx.add_medicine(3, "Cetirizine", "Allergy", 9, 300).await;

        let err = purchase(&ctx.pool, "bob", 1, 1).await.unwrap_err();

        let ServiceError::InsufficientStock(shortage) = err else {
            panic!("expected InsufficientStock");
        };
        assert_eq!(
            shortage.substitutes.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![2]
        );

        Ok(())
    }

    #[tokio::test]
    async fn rejects_non_positive_quantity_before_touching_storage() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Ibuprofen", "Pain relief", 5, 800).await;

        for quantity in [0, -1] {
            let err = purchase(&ctx.pool, "erin", 1, quantity).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&ctx.pool)
            .await?;
        assert_eq!(users, 0);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_medicine_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        let err = purchase(&ctx.pool, "frank", 404, 1).await.unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(ledger_rows(&ctx).await.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn buying_the_whole_shelf_reaches_zero() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Ibuprofen", "Pain relief", 5, 800).await;

        let receipt = purchase(&ctx.pool, "gina", 1, 5).await?;

        assert_eq!(receipt.stock, 0);
        assert_eq!(ctx.stock_of(1).await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn price_is_snapshotted_at_purchase_time() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Ibuprofen", "Pain relief", 10, 800).await;

        purchase(&ctx.pool, "hank", 1, 2).await?;
        ctx.set_price(1, 1200).await;
        purchase(&ctx.pool, "hank", 1, 1).await?;

        let rows = ledger_rows(&ctx).await;
        assert_eq!(rows[0].unit_price, Money::from_cents(800));
        assert_eq!(rows[0].total_price, Money::from_cents(1600));
        assert_eq!(rows[1].unit_price, Money::from_cents(1200));
        assert!(rows
            .iter()
            .all(|row| row.unit_price.checked_mul(row.quantity) == Some(row.total_price)));

        Ok(())
    }

    #[tokio::test]
    async fn stock_drained_after_the_check_rolls_back() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Ibuprofen", "Pain relief", 5, 800).await;
        ctx.add_medicine(2, "Paracetamol", "Pain relief", 9, 500).await;
        let username = Username::parse("ivan")?;
        let user = users::resolve(&ctx.pool, &username).await?;

        let checked = catalog::require(&ctx.pool, 1).await?;
        sqlx::query("UPDATE medicines SET stock = 1 WHERE id = 1")
            .execute(&ctx.pool)
            .await?;

        let err = commit(&ctx.pool, user, &username, checked, Quantity::try_from(3)?)
            .await
            .unwrap_err();

        let ServiceError::InsufficientStock(shortage) = err else {
            panic!("expected InsufficientStock");
        };
        assert_eq!(shortage.available, 1);
        assert_eq!(shortage.requested, 3);
        assert_eq!(
            shortage.substitutes.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![2]
        );
        assert_eq!(ctx.stock_of(1).await, 1);
        assert!(ledger_rows(&ctx).await.is_empty());

        Ok(())
    }

    #[test]
    fn advance_moves_the_stage() {
        let mut stage = PurchaseStage::Validating;

        advance(&mut stage, PurchaseStage::UserResolved);

        assert_eq!(stage, PurchaseStage::UserResolved);
    }
}
