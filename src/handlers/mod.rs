//! Telegram request layer. Turns chat commands into [`Pharmacy`] calls and
//! their results into MarkdownV2 replies.

use phf::phf_ordered_map;
use teloxide::{
    dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler},
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, ParseMode, ReplyMarkup},
    utils::command::BotCommands,
};

use crate::{
    services::{Pharmacy, ServiceError},
    utils::escape_markdown,
    Error,
};

pub mod catalog;
pub mod order;
pub mod recommend;
pub mod render;

pub type HandlerResult = Result<(), Error>;

#[derive(BotCommands, Debug, Clone, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start interacting with the pharmacy bot.")]
    Start,
    #[command(description = "Display help information about available commands.")]
    Help,
    #[command(description = "Display the main menu.")]
    Menu,
    #[command(description = "Show your purchases and recommended medicines.")]
    Recommend,
    #[command(description = "Search medicines by name or symptom.")]
    Search(String),
    #[command(description = "Buy a medicine: /buy <medicine_id> [quantity].")]
    Buy(String),
    #[command(description = "Show your purchase history.")]
    History,
    #[command(description = "List substitutes: /substitutes <medicine_id>.")]
    Substitutes(String),
    #[command(description = "Show medicine details: /medicine <medicine_id>.")]
    Medicine(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Recommend,
    History,
    Help,
}

/// Reply-keyboard labels, in display order.
pub static MENU: phf::OrderedMap<&'static str, MenuAction> = phf_ordered_map! {
    "💊 Recommendations" => MenuAction::Recommend,
    "📜 My History" => MenuAction::History,
    "❓ Help" => MenuAction::Help,
};

pub fn schema() -> UpdateHandler<Error> {
    Update::filter_message()
        .branch(dptree::entry().filter_command::<Command>().endpoint(answer))
        .branch(dptree::endpoint(handle_message))
}

/// The identity the core knows this chat user by: the Telegram handle, or
/// `tg<id>` for users without one.
pub fn username_of(msg: &Message) -> Option<String> {
    msg.from.as_ref().map(|user| {
        user.username
            .clone()
            .unwrap_or_else(|| format!("tg{}", user.id.0))
    })
}

async fn answer(bot: Bot, msg: Message, cmd: Command, pharmacy: Pharmacy) -> HandlerResult {
    log::info!("Received command {:?} in chat {}", cmd, msg.chat.id.0);

    match cmd {
        Command::Start => {
            send_markdown(
                &bot,
                msg.chat.id,
                "Welcome to the pharmacy bot\\! Use /recommend to see suggestions or /search to find a medicine\\."
                    .to_string(),
            )
            .await?
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Menu => send_menu(&bot, msg.chat.id).await?,
        Command::Recommend => recommend::recommend(&bot, &msg, &pharmacy).await?,
        Command::History => recommend::history(&bot, &msg, &pharmacy).await?,
        Command::Search(query) => catalog::search(&bot, &msg, &pharmacy, &query).await?,
        Command::Substitutes(args) => catalog::substitutes(&bot, &msg, &pharmacy, &args).await?,
        Command::Medicine(args) => catalog::medicine(&bot, &msg, &pharmacy, &args).await?,
        Command::Buy(args) => order::buy(&bot, &msg, &pharmacy, &args).await?,
    }

    Ok(())
}

/// Handles reply-keyboard presses and any other plain text.
async fn handle_message(bot: Bot, msg: Message, pharmacy: Pharmacy) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    match MENU.get(text) {
        Some(MenuAction::Recommend) => recommend::recommend(&bot, &msg, &pharmacy).await?,
        Some(MenuAction::History) => recommend::history(&bot, &msg, &pharmacy).await?,
        Some(MenuAction::Help) => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        None => {
            bot.send_message(
                msg.chat.id,
                "I don't understand that command. Please use the menu or type /help for available commands.",
            )
            .await?;
        }
    }

    Ok(())
}

async fn send_menu(bot: &Bot, chat_id: ChatId) -> HandlerResult {
    let keyboard = KeyboardMarkup::new(
        MENU.keys()
            .map(|label| vec![KeyboardButton::new(*label)])
            .collect::<Vec<_>>(),
    )
    .resize_keyboard()
    .one_time_keyboard();

    bot.send_message(chat_id, "Please choose an option:")
        .reply_markup(ReplyMarkup::Keyboard(keyboard))
        .await?;

    Ok(())
}

pub(crate) async fn send_markdown(bot: &Bot, chat_id: ChatId, text: String) -> HandlerResult {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;

    Ok(())
}

/// Replies with the user-facing side of `error`. Storage failures are logged
/// and replaced by a generic apology.
pub(crate) async fn reply_error(bot: &Bot, chat_id: ChatId, error: ServiceError) -> HandlerResult {
    let text = match &error {
        ServiceError::Storage(e) => {
            log::error!("Storage failure while serving chat {}: {}", chat_id.0, e);
            "Something went wrong on our side, please try again later\\.".to_string()
        }
        ServiceError::InsufficientStock(shortage) => render::shortage(shortage),
        other => format!("❌ {}", escape_markdown(&other.to_string())),
    };

    send_markdown(bot, chat_id, text).await
}

/// Username for the sender, or a polite refusal when the update has no sender.
pub(crate) async fn require_username(bot: &Bot, msg: &Message) -> Result<Option<String>, Error> {
    match username_of(msg) {
        Some(username) => Ok(Some(username)),
        None => {
            bot.send_message(msg.chat.id, "Couldn't identify you, please message me directly.")
                .await?;
            Ok(None)
        }
    }
}
