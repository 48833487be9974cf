use teloxide::prelude::*;

use super::{render, reply_error, require_username, send_markdown, HandlerResult};
use crate::services::Pharmacy;

pub async fn recommend(bot: &Bot, msg: &Message, pharmacy: &Pharmacy) -> HandlerResult {
    let Some(username) = require_username(bot, msg).await? else {
        return Ok(());
    };

    log::info!("Fetching recommendations for {}", username);
    match pharmacy.recommend(&username).await {
        Ok(recs) => send_markdown(bot, msg.chat.id, render::recommendations(&recs)).await,
        Err(e) => reply_error(bot, msg.chat.id, e).await,
    }
}

pub async fn history(bot: &Bot, msg: &Message, pharmacy: &Pharmacy) -> HandlerResult {
    let Some(username) = require_username(bot, msg).await? else {
        return Ok(());
    };

    log::info!("Fetching purchase history for {}", username);
    match pharmacy.history(&username).await {
        Ok(entries) => send_markdown(bot, msg.chat.id, render::history(&entries)).await,
        Err(e) => reply_error(bot, msg.chat.id, e).await,
    }
}
