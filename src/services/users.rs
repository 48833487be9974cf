//! User registry: username to stable user id, created on first contact.

use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};

use super::{errors::ServiceError, input::Username};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedUser {
    pub user_id: i64,
    pub is_new: bool,
}

/// Finds the user behind `username`, creating it when this is the first contact.
///
/// Creation relies on the `UNIQUE` constraint on `users.username`: the insert is
/// a no-op when the name already exists, and a creator that loses a race simply
/// reads back the winner's row. Two concurrent calls for the same new name
/// therefore agree on one id.
pub async fn resolve(pool: &SqlitePool, username: &Username) -> Result<ResolvedUser, ServiceError> {
    if let Some(user_id) = lookup(pool, username).await? {
        return Ok(ResolvedUser {
            user_id,
            is_new: false,
        });
    }

    let created: Option<i64> = sqlx::query_scalar(
        "INSERT INTO users (username) VALUES (?1) ON CONFLICT (username) DO NOTHING RETURNING id",
    )
    .bind(username.as_str())
    .fetch_optional(pool)
    .await?;

    if let Some(user_id) = created {
        log::info!("Registered new user {} ({})", username.as_str(), user_id);
        return Ok(ResolvedUser {
            user_id,
            is_new: true,
        });
    }

    log::debug!(
        "Lost creation race for {}, reading existing row",
        username.as_str()
    );
    let user_id = read_back(pool, username).await?;

    Ok(ResolvedUser {
        user_id,
        is_new: false,
    })
}

/// Lookup after a lost creation race. Users are never deleted, so a missing
/// row here is a storage fault rather than an unknown user.
async fn read_back(pool: &SqlitePool, username: &Username) -> Result<i64, ServiceError> {
    lookup(pool, username).await?.ok_or_else(|| {
        log::error!(
            "User {} missing after a conflicting insert",
            username.as_str()
        );
        ServiceError::Storage(sqlx::Error::RowNotFound)
    })
}

/// Read-only lookup; never creates a user.
pub async fn lookup<'e, E>(executor: E, username: &Username) -> Result<Option<i64>, ServiceError>
where
    E: SqliteExecutor<'e>,
{
    let user_id = sqlx::query_scalar("SELECT id FROM users WHERE username = ?1")
        .bind(username.as_str())
        .fetch_optional(executor)
        .await?;

    Ok(user_id)
}
