use teloxide::prelude::*;

use super::{render, reply_error, require_username, send_markdown, HandlerResult};
use crate::services::{input::parse_medicine_id, Pharmacy, Quantity, ServiceError};

const BUY_USAGE: &str = "Usage: /buy <medicine_id> [quantity]";

/// Splits `/buy` arguments into a medicine id and a quantity (default 1).
pub fn parse_buy_args(args: &str) -> Result<(i64, i64), ServiceError> {
    let mut parts = args.split_whitespace();

    let medicine_id = parts
        .next()
        .ok_or_else(|| ServiceError::InvalidInput(BUY_USAGE.to_string()))
        .and_then(parse_medicine_id)?;

    let quantity = match parts.next() {
        Some(raw) => Quantity::parse(raw)?.get(),
        None => 1,
    };

    if parts.next().is_some() {
        return Err(ServiceError::InvalidInput(BUY_USAGE.to_string()));
    }

    Ok((medicine_id, quantity))
}

pub async fn buy(bot: &Bot, msg: &Message, pharmacy: &Pharmacy, args: &str) -> HandlerResult {
    let Some(username) = require_username(bot, msg).await? else {
        return Ok(());
    };

    let (medicine_id, quantity) = match parse_buy_args(args) {
        Ok(parsed) => parsed,
        Err(e) => return reply_error(bot, msg.chat.id, e).await,
    };

    match pharmacy.purchase(&username, medicine_id, quantity).await {
        Ok(receipt) => send_markdown(bot, msg.chat.id, render::receipt(&receipt)).await,
        Err(e) => reply_error(bot, msg.chat.id, e).await,
    }
}
