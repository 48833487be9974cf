use teloxide::prelude::*;

use super::{render, reply_error, send_markdown, HandlerResult};
use crate::services::{input::parse_medicine_id, Pharmacy};

pub async fn search(bot: &Bot, msg: &Message, pharmacy: &Pharmacy, query: &str) -> HandlerResult {
    if query.trim().is_empty() {
        bot.send_message(msg.chat.id, "Usage: /search <name or symptom>")
            .await?;
        return Ok(());
    }

    log::info!("Searching medicines for '{}'", query.trim());
    match pharmacy.search(query).await {
        Ok(results) => {
            send_markdown(bot, msg.chat.id, render::search_results(query.trim(), &results)).await
        }
        Err(e) => reply_error(bot, msg.chat.id, e).await,
    }
}

pub async fn substitutes(bot: &Bot, msg: &Message, pharmacy: &Pharmacy, args: &str) -> HandlerResult {
    let medicine_id = match parse_medicine_id(args) {
        Ok(id) => id,
        Err(e) => return reply_error(bot, msg.chat.id, e).await,
    };

    match pharmacy.substitutes(medicine_id).await {
        Ok(found) => send_markdown(bot, msg.chat.id, render::substitutes(medicine_id, &found)).await,
        Err(e) => reply_error(bot, msg.chat.id, e).await,
    }
}

pub async fn medicine(bot: &Bot, msg: &Message, pharmacy: &Pharmacy, args: &str) -> HandlerResult {
    let medicine_id = match parse_medicine_id(args) {
        Ok(id) => id,
        Err(e) => return reply_error(bot, msg.chat.id, e).await,
    };

    match pharmacy.medicine(medicine_id).await {
        Ok(profile) => send_markdown(bot, msg.chat.id, render::profile(&profile)).await,
        Err(e) => reply_error(bot, msg.chat.id, e).await,
    }
}
