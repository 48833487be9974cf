//! Recommendation engine.
//!
//! Three tiers, all plain frequency counts over the purchase ledger:
//! the user's own history, medicines favoured by co-purchasers, and global
//! top-sellers as the cold-start fallback.

use serde::Serialize;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use super::{errors::ServiceError, ledger, users::ResolvedUser};
use crate::db::models::{PurchasedMedicine, RankedMedicine};

pub const RECOMMENDATION_LIMIT: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendations {
    pub user_id: i64,
    pub new_user: bool,
    pub history: Vec<PurchasedMedicine>,
    pub collaborative: Vec<RankedMedicine>,
    pub top_meds: Vec<RankedMedicine>,
}

/// Builds all three lists from one read transaction, so they describe the same
/// ledger snapshot.
pub async fn recommend(pool: &SqlitePool, user: ResolvedUser) -> Result<Recommendations, ServiceError> {
    let mut tx = pool.begin().await?;
    let recommendations = recommend_in(&mut tx, user).await?;
    tx.commit().await?;

    log::debug!(
        "Recommendations for user {}: {} purchased, {} collaborative, {} top",
        user.user_id,
        recommendations.history.len(),
        recommendations.collaborative.len(),
        recommendations.top_meds.len()
    );

    Ok(recommendations)
}

async fn recommend_in(
    conn: &mut SqliteConnection,
    user: ResolvedUser,
) -> Result<Recommendations, ServiceError> {
    let history = ledger::purchased_medicines(&mut *conn, user.user_id).await?;

    let collaborative = if history.is_empty() {
        Vec::new()
    } else {
        collaborative(&mut *conn, user.user_id).await?
    };

    let top_meds = if user.is_new || history.is_empty() {
        top_sellers(&mut *conn).await?
    } else {
        Vec::new()
    };

    Ok(Recommendations {
        user_id: user.user_id,
        new_user: user.is_new,
        history,
        collaborative,
        top_meds,
    })
}

/// Medicines bought by co-purchasers of `user_id` that `user_id` has not bought.
///
/// Every purchase event of every co-purchaser counts once toward its medicine.
/// Ties go to the lower medicine id.
pub async fn collaborative<'e, E>(executor: E, user_id: i64) -> Result<Vec<RankedMedicine>, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    let ranked = sqlx::query_as::<_, RankedMedicine>(
        "WITH owned AS ( \
             SELECT DISTINCT medicine_id FROM purchase_history \
             WHERE user_id = ?1 AND action = 'purchase' \
         ), \
         peers AS ( \
             SELECT DISTINCT user_id FROM purchase_history \
             WHERE action = 'purchase' AND user_id != ?1 \
               AND medicine_id IN (SELECT medicine_id FROM owned) \
         ) \
         SELECT m.id, m.name, m.uses, m.stock, m.price_cents, COUNT(*) AS frequency \
         FROM purchase_history ph \
         JOIN medicines m ON m.id = ph.medicine_id \
         WHERE ph.action = 'purchase' \
           AND ph.user_id IN (SELECT user_id FROM peers) \
           AND ph.medicine_id NOT IN (SELECT medicine_id FROM owned) \
         GROUP BY m.id \
         ORDER BY frequency DESC, m.id ASC \
         LIMIT ?2",
    )
    .bind(user_id)
    .bind(RECOMMENDATION_LIMIT)
    .fetch_all(executor)
    .await?;

    Ok(ranked)
}

/// Catalog-wide purchase counts. Never-sold medicines rank with zero.
pub async fn top_sellers<'e, E>(executor: E) -> Result<Vec<RankedMedicine>, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    let ranked = sqlx::query_as::<_, RankedMedicine>(
        "SELECT m.id, m.name, m.uses, m.stock, m.price_cents, COUNT(ph.id) AS frequency \
         FROM medicines m \
         LEFT JOIN purchase_history ph ON ph.medicine_id = m.id AND ph.action = 'purchase' \
         GROUP BY m.id \
         ORDER BY frequency DESC, m.id ASC \
         LIMIT ?1",
    )
    .bind(RECOMMENDATION_LIMIT)
    .fetch_all(executor)
    .await?;

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::test_support::TestContext;

    fn ids(ranked: &[RankedMedicine]) -> Vec<i64> {
        ranked.iter().map(|r| r.medicine.id).collect()
    }

    #[tokio::test]
    async fn new_user_gets_top_sellers_only() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Paracetamol", "Pain relief", 10, 500).await;
        ctx.add_medicine(2, "Ibuprofen", "Pain relief", 10, 800).await;
        ctx.add_medicine(3, "Cetirizine", "Allergy", 10, 300).await;
        let other = ctx.add_user("zoe").await;
        ctx.record_purchase(other, 3, 1).await;
        ctx.record_purchase(other, 3, 1).await;
        ctx.record_purchase(other, 2, 1).await;

        let user = ResolvedUser {
            user_id: ctx.add_user("newcomer").await,
            is_new: true,
        };
        let recs = recommend(&ctx.pool, user).await?;

        assert!(recs.new_user);
        assert!(recs.history.is_empty());
        assert!(recs.collaborative.is_empty());
        assert_eq!(ids(&recs.top_meds), vec![3, 2, 1]);
        assert_eq!(
            recs.top_meds.iter().map(|r| r.frequency).collect::<Vec<_>>(),
            vec![2, 1, 0]
        );

        Ok(())
    }

    #[tokio::test]
    async fn returning_user_without_history_still_gets_top_sellers() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Paracetamol", "Pain relief", 10, 500).await;

        let user = ResolvedUser {
            user_id: ctx.add_user("lurker").await,
            is_new: false,
        };
        let recs = recommend(&ctx.pool, user).await?;

        assert_eq!(ids(&recs.top_meds), vec![1]);
        assert!(recs.collaborative.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn top_sellers_break_ties_by_id_and_cap_at_five() -> TestResult {
        let ctx = TestContext::new().await;
        for id in (1..=7).rev() {
            ctx.add_medicine(id, &format!("Remedy {}", id), "General", 10, 100)
                .await;
        }
        let buyer = ctx.add_user("buyer").await;
        ctx.record_purchase(buyer, 6, 1).await;

        let ranked = top_sellers(&ctx.pool).await?;

        assert_eq!(ids(&ranked), vec![6, 1, 2, 3, 4]);

        Ok(())
    }

    #[tokio::test]
    async fn co_purchasers_suggest_unowned_medicines() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "A", "Pain relief", 10, 100).await;
        ctx.add_medicine(2, "B", "Allergy", 10, 100).await;
        let bob = ctx.add_user("bob").await;
        let carol = ctx.add_user("carol").await;
        ctx.record_purchase(bob, 1, 1).await;
        ctx.record_purchase(carol, 1, 1).await;
        ctx.record_purchase(carol, 2, 1).await;

        let recs = recommend(&ctx.pool, ResolvedUser { user_id: bob, is_new: false }).await?;

        assert_eq!(
            recs.history.iter().map(|o| o.medicine.id).collect::<Vec<_>>(),
            vec![1]
        );
        assert_eq!(ids(&recs.collaborative), vec![2]);
        assert!(recs.top_meds.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn collaborative_counts_events_and_ignores_strangers() -> TestResult {
        let ctx = TestContext::new().await;
        for id in 1..=5 {
            ctx.add_medicine(id, &format!("M{}", id), "General", 50, 100).await;
        }
        let bob = ctx.add_user("bob").await;
        let carol = ctx.add_user("carol").await;
        let dan = ctx.add_user("dan").await;
        let stranger = ctx.add_user("stranger").await;

        ctx.record_purchase(bob, 1, 1).await;
        ctx.record_purchase(bob, 2, 1).await;

        ctx.record_purchase(carol, 1, 1).await;
        ctx.record_purchase(carol, 4, 1).await;
        ctx.record_purchase(carol, 3, 1).await;

        ctx.record_purchase(dan, 2, 1).await;
        ctx.record_purchase(dan, 4, 1).await;
        ctx.record_purchase(dan, 4, 1).await;

        // Shares nothing with bob, so never counts.
        for _ in 0..5 {
            ctx.record_purchase(stranger, 5, 1).await;
        }

        let ranked = collaborative(&ctx.pool, bob).await?;

        assert_eq!(ids(&ranked), vec![4, 3]);
        assert_eq!(
            ranked.iter().map(|r| r.frequency).collect::<Vec<_>>(),
            vec![3, 1]
        );

        Ok(())
    }

    #[tokio::test]
    async fn history_lists_every_purchase_event() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Paracetamol", "Pain relief", 10, 500).await;
        ctx.add_medicine(2, "Ibuprofen", "Pain relief", 10, 800).await;
        let alice = ctx.add_user("alice").await;
        ctx.record_purchase(alice, 1, 1).await;
        ctx.record_purchase(alice, 2, 1).await;
        ctx.record_purchase(alice, 1, 2).await;

        let recs = recommend(&ctx.pool, ResolvedUser { user_id: alice, is_new: false }).await?;

        assert_eq!(
            recs.history.iter().map(|p| p.medicine.id).collect::<Vec<_>>(),
            vec![1, 2, 1]
        );

        Ok(())
    }

    #[tokio::test]
    async fn collaborative_is_empty_without_peers() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "A", "Pain relief", 10, 100).await;
        let loner = ctx.add_user("loner").await;
        ctx.record_purchase(loner, 1, 1).await;

        let recs = recommend(&ctx.pool, ResolvedUser { user_id: loner, is_new: false }).await?;

        assert_eq!(recs.history.len(), 1);
        assert!(recs.collaborative.is_empty());
        assert!(recs.top_meds.is_empty());

        Ok(())
    }
}
