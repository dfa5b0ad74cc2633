use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use vacancybot::bot::{Database, Incoming, MessageCatalog, TelegramClient, handlers, messages};
use vacancybot::config::Config;

struct BotState {
    telegram: TelegramClient,
    db: Database,
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "vacancybot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("vacancybot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting vacancybot...");
    info!("Loaded config from {config_path}");

    let catalog = match &config.messages_path {
        Some(path) => match MessageCatalog::load(path) {
            Ok(catalog) => catalog,
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        },
        None => MessageCatalog::builtin(),
    };
    info!("Message catalog has {} entries", catalog.len());
    if messages::install(catalog).is_err() {
        warn!("Message catalog was already installed");
    }

    let db = match Database::open(&config.database_path) {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database {:?}: {e}", config.database_path);
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);
    let state = Arc::new(BotState {
        telegram: TelegramClient::new(bot.clone()),
        db,
    });

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback_query));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(event) = Incoming::from_message(&msg) else {
        return Ok(());
    };

    let user_id = event.sender.id;
    let preview: String = event.text().unwrap_or("").chars().take(100).collect();
    info!("📨 Message from {}: \"{preview}\"", user_id);

    if let Err(e) = handlers::handle(&state.telegram, &state.db, event).await {
        warn!("Failed to handle message from {}: {e}", user_id);
    }

    Ok(())
}

async fn handle_callback_query(query: CallbackQuery, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(event) = Incoming::from_callback(&query) else {
        return Ok(());
    };
    let user_id = event.sender.id;
    info!("🔘 Callback from {}: {:?}", user_id, event.callback_data());

    if let Err(e) = handlers::handle(&state.telegram, &state.db, event).await {
        warn!("Failed to handle callback from {}: {e}", user_id);
    }

    Ok(())
}
