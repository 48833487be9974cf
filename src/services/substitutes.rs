//! Substitute lookup by shared therapeutic use.
//!
//! Two medicines are substitutes when their `uses` text is byte-for-byte equal.
//! There is no fuzzy or tag-level matching; "Pain relief" and "pain relief"
//! are different uses.

use sqlx::SqliteExecutor;

use super::{catalog, errors::ServiceError};
use crate::db::models::Medicine;

pub const SUBSTITUTE_LIMIT: i64 = 5;

pub async fn substitutes<'e, E>(executor: E, medicine_id: i64) -> Result<Vec<Medicine>, ServiceError>
where
    E: SqliteExecutor<'e> + Copy,
{
    let medicine = catalog::require(executor, medicine_id).await?;
    substitutes_for(executor, &medicine).await
}

/// Up to [`SUBSTITUTE_LIMIT`] other medicines with exactly `medicine.uses`,
/// in-stock ones first. A medicine without a recorded use has no substitutes.
pub async fn substitutes_for<'e, E>(executor: E, medicine: &Medicine) -> Result<Vec<Medicine>, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    if medicine.uses.trim().is_empty() {
        return Ok(Vec::new());
    }

    let medicines = sqlx::query_as::<_, Medicine>(
        "SELECT id, name, uses, stock, price_cents FROM medicines \
         WHERE id != ?1 AND uses = ?2 \
         ORDER BY stock DESC, id ASC \
         LIMIT ?3",
    )
    .bind(medicine.id)
    .bind(&medicine.uses)
    .bind(SUBSTITUTE_LIMIT)
    .fetch_all(executor)
    .await?;

    Ok(medicines)
}
