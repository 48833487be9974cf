use futures::future;
use serde::Serialize;
use sqlx::SqlitePool;
use teloxide::prelude::*;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::{catalog, errors::ServiceError, substitutes};
use crate::{db::models::Medicine, utils::escape_markdown};

/// An empty shelf together with what can be sold instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockAlert {
    pub medicine: Medicine,
    pub substitutes: Vec<Medicine>,
}

/// Schedules the out-of-stock report for the pharmacy chat.
///
/// Each run collects every medicine with zero stock plus its substitutes and
/// posts one message. A failing run is logged and the schedule keeps going.
///
/// Parameters:
/// - `pool`: SQLite connection pool the report reads from.
/// - `bot`: Telegram Bot instance used to post the report.
/// - `pharmacy_chat_id`: The ChatId of the pharmacy chat that receives the report.
/// - `schedule`: Six-field cron expression, seconds first.
///
/// Returns:
/// - `Ok(JobScheduler)` once the job is added and the scheduler started. Keep it
///   alive for as long as alerts should fire.
/// - `Err(..)` if the cron expression is invalid or the scheduler fails to start.
pub async fn schedule_stock_alerts(
    pool: SqlitePool,
    bot: Bot,
    pharmacy_chat_id: ChatId,
    schedule: &str,
) -> Result<JobScheduler, Box<dyn std::error::Error + Send + Sync>> {
    let sched = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _l| {
        let bot = bot.clone();
        let pool = pool.clone();
        Box::pin(async move {
            match check_and_notify(&pool, &bot, pharmacy_chat_id).await {
                Ok(count) => log::info!("Stock alert run completed, {} medicines out of stock", count),
                Err(e) => log::error!("Error running stock alerts: {}", e),
            }
        })
    })
    .map_err(|e| {
        log::error!("Failed to create stock alert job: {}", e);
        e
    })?;

    sched.add(job).await.map_err(|e| {
        log::error!("Failed to add stock alert job to scheduler: {}", e);
        e
    })?;

    sched.start().await?;

    log::info!("Stock alert scheduler started ({})", schedule);
    Ok(sched)
}

async fn check_and_notify(
    pool: &SqlitePool,
    bot: &Bot,
    chat_id: ChatId,
) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    let alerts = collect_stock_alerts(pool).await?;

    if alerts.is_empty() {
        return Ok(0);
    }

    bot.send_message(chat_id, render_stock_alerts(&alerts))
        .parse_mode(teloxide::types::ParseMode::MarkdownV2)
        .await?;

    Ok(alerts.len())
}

/// Every out-of-stock medicine with its substitutes, in catalog order.
///
/// Substitute lookups run concurrently; the first failing lookup fails the whole report.
pub async fn collect_stock_alerts(pool: &SqlitePool) -> Result<Vec<StockAlert>, ServiceError> {
    let empty = catalog::out_of_stock(pool).await?;

    let lookups = empty
        .iter()
        .map(|medicine| substitutes::substitutes_for(pool, medicine));
    let found = future::join_all(lookups).await;

    empty
        .into_iter()
        .zip(found)
        .map(|(medicine, substitutes)| -> Result<StockAlert, ServiceError> {
            Ok(StockAlert {
                medicine,
                substitutes: substitutes?,
            })
        })
        .collect()
}

pub fn render_stock_alerts(alerts: &[StockAlert]) -> String {
    let body = alerts
        .iter()
        .map(|alert| {
            let substitutes = if alert.substitutes.is_empty() {
                "no substitutes".to_string()
            } else {
                alert
                    .substitutes
                    .iter()
                    .map(|s| format!("{} \\({} left\\)", escape_markdown(&s.name), s.stock))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "• *{}* \\(\\#{}\\)\n   Substitutes: {}",
                escape_markdown(&alert.medicine.name),
                alert.medicine.id,
                substitutes
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("⚠️ *Out of stock*\n\n{}", body)
}
