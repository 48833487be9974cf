use dotenvy::dotenv;
use envconfig::Envconfig;
use medirec::{
    config::Config,
    db::init_db,
    handlers,
    services::{alerts::schedule_stock_alerts, Pharmacy},
    Error,
};
use teloxide::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize the logger with default settings or "info" level if not specified
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting the pharmacy bot...");

    // Load environment variables from a .env file if present
    dotenv().ok();

    let config = Config::init_from_env()?;

    let pool = init_db(&config.database_url, config.database_max_connections).await?;
    let pharmacy = Pharmacy::new(pool);

    let bot = Bot::new(config.telegram_bot_token);

    // Held until shutdown so the alert job keeps firing
    let _alerts = match config.pharmacy_chat_id {
        Some(chat_id) => Some(
            schedule_stock_alerts(
                pharmacy.pool().clone(),
                bot.clone(),
                ChatId(chat_id),
                &config.stock_alert_schedule,
            )
            .await?,
        ),
        None => {
            log::info!("PHARMACY_CHAT_ID not set, stock alerts disabled");
            None
        }
    };

    Dispatcher::builder(bot, handlers::schema())
        .dependencies(dptree::deps![pharmacy])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Shutting down gracefully");
    Ok(())
}
