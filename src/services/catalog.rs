//! Read access to the medicine catalog.

use sqlx::SqliteExecutor;

use super::errors::ServiceError;
use crate::db::models::{Medicine, MedicineProfile};

pub const SEARCH_LIMIT: i64 = 20;

const MEDICINE_COLUMNS: &str = "id, name, uses, stock, price_cents";

pub async fn get<'e, E>(executor: E, medicine_id: i64) -> Result<Option<Medicine>, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    let medicine = sqlx::query_as::<_, Medicine>(&format!(
        "SELECT {} FROM medicines WHERE id = ?1",
        MEDICINE_COLUMNS
    ))
    .bind(medicine_id)
    .fetch_optional(executor)
    .await?;

    Ok(medicine)
}

pub async fn require<'e, E>(executor: E, medicine_id: i64) -> Result<Medicine, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    get(executor, medicine_id)
        .await?
        .ok_or_else(|| ServiceError::medicine_not_found(medicine_id))
}

pub async fn profile<'e, E>(executor: E, medicine_id: i64) -> Result<MedicineProfile, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, MedicineProfile>(&format!(
        "SELECT {}, chemical_class, therapeutic_class, action_class, habit_forming, side_effects \
         FROM medicines WHERE id = ?1",
        MEDICINE_COLUMNS
    ))
    .bind(medicine_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| ServiceError::medicine_not_found(medicine_id))
}

pub async fn current_stock<'e, E>(executor: E, medicine_id: i64) -> Result<i64, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar("SELECT stock FROM medicines WHERE id = ?1")
        .bind(medicine_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| ServiceError::medicine_not_found(medicine_id))
}

/// Case-insensitive substring search over name and uses.
///
/// A blank query matches nothing. `%` and `_` in the query are literal.
pub async fn search<'e, E>(executor: E, query: &str) -> Result<Vec<Medicine>, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!("%{}%", escape_like(&query.to_lowercase()));

    let medicines = sqlx::query_as::<_, Medicine>(&format!(
        "SELECT {} FROM medicines \
         WHERE LOWER(name) LIKE ?1 ESCAPE '\\' OR LOWER(uses) LIKE ?1 ESCAPE '\\' \
         ORDER BY id LIMIT ?2",
        MEDICINE_COLUMNS
    ))
    .bind(pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(executor)
    .await?;

    Ok(medicines)
}

pub async fn out_of_stock<'e, E>(executor: E) -> Result<Vec<Medicine>, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    let medicines = sqlx::query_as::<_, Medicine>(&format!(
        "SELECT {} FROM medicines WHERE stock = 0 ORDER BY id",
        MEDICINE_COLUMNS
    ))
    .fetch_all(executor)
    .await?;

    Ok(medicines)
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::test_support::TestContext;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[tokio::test]
    async fn search_matches_name_or_uses_ignoring_case() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Paracetamol", "Pain relief", 10, 500).await;
        ctx.add_medicine(2, "Ibuprofen", "Pain relief", 5, 800).await;
        ctx.add_medicine(3, "Cetirizine", "Allergy", 3, 300).await;

        let by_use = search(&ctx.pool, "PAIN").await?;
        let by_name = search(&ctx.pool, "  cetiri ").await?;

        assert_eq!(by_use.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(by_name.iter().map(|m| m.id).collect::<Vec<_>>(), vec![3]);

        Ok(())
    }

    #[tokio::test]
    async fn blank_search_returns_nothing() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Paracetamol", "Pain relief", 10, 500).await;

        assert!(search(&ctx.pool, "   ").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Paracetamol", "Pain relief", 10, 500).await;

        assert!(search(&ctx.pool, "%").await?.is_empty());
        assert!(search(&ctx.pool, "_").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn search_is_capped() -> TestResult {
        let ctx = TestContext::new().await;
        for id in 1..=25 {
            ctx.add_medicine(id, &format!("Vitamin {}", id), "Supplement", 1, 100)
                .await;
        }

        assert_eq!(search(&ctx.pool, "vitamin").await?.len() as i64, SEARCH_LIMIT);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_medicine_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        assert_eq!(get(&ctx.pool, 99).await?, None);
        assert!(matches!(require(&ctx.pool, 99).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(profile(&ctx.pool, 99).await, Err(ServiceError::NotFound(_))));

        Ok(())
    }

    #[tokio::test]
    async fn profile_includes_descriptive_columns() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Paracetamol", "Pain relief", 10, 500).await;
        sqlx::query("UPDATE medicines SET therapeutic_class = 'Analgesic' WHERE id = 1")
            .execute(&ctx.pool)
            .await?;

        let profile = profile(&ctx.pool, 1).await?;

        assert_eq!(profile.medicine.name, "Paracetamol");
        assert_eq!(profile.therapeutic_class.as_deref(), Some("Analgesic"));
        assert_eq!(profile.side_effects, None);

        Ok(())
    }

    #[tokio::test]
    async fn out_of_stock_lists_only_empty_shelves() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.add_medicine(1, "Paracetamol", "Pain relief", 0, 500).await;
        ctx.add_medicine(2, "Ibuprofen", "Pain relief", 4, 800).await;

        let empty = out_of_stock(&ctx.pool).await?;

        assert_eq!(empty.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1]);

        Ok(())
    }
}
