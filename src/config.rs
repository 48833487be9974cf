use envconfig::Envconfig;

/// Bot configuration, read from the environment (and `.env` when present).
#[derive(Envconfig, Debug)]
pub struct Config {
    #[envconfig(from = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: String,

    #[envconfig(from = "DATABASE_URL", default = "sqlite://medirec.db")]
    pub database_url: String,

    #[envconfig(from = "DATABASE_MAX_CONNECTIONS", default = "5")]
    pub database_max_connections: u32,

    /// Chat that receives out-of-stock reports. Alerts are off when unset.
    #[envconfig(from = "PHARMACY_CHAT_ID")]
    pub pharmacy_chat_id: Option<i64>,

    /// Six-field cron expression, seconds first.
    #[envconfig(from = "STOCK_ALERT_SCHEDULE", default = "0 0 8 * * *")]
    pub stock_alert_schedule: String,
}

/// Configuration of the `seed` binary.
#[derive(Envconfig, Debug)]
pub struct SeedConfig {
    #[envconfig(from = "DATABASE_URL", default = "sqlite://medirec.db")]
    pub database_url: String,

    #[envconfig(from = "DATABASE_MAX_CONNECTIONS", default = "5")]
    pub database_max_connections: u32,

    /// Also generate random demo purchases so recommendations have data.
    #[envconfig(from = "SEED_DEMO_HISTORY", default = "false")]
    pub seed_demo_history: bool,
}
