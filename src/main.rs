use clap::{Parser, Subcommand};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use mousebot::application::errors::BotError;
use mousebot::application::messaging::{
    DebugChannelMiddleware, LoggingMiddleware, MessageDispatcher, SelfMessageMiddleware,
};
use mousebot::application::services::CounterBook;
use mousebot::domain::traits::{Bot, BotInfo};
use mousebot::infrastructure::adapters::{ConsoleAdapter, TelegramAdapter};
use mousebot::infrastructure::config::Config;
use mousebot::infrastructure::storage::JsonFileStore;

/// Long-poll timeout for getUpdates
const POLL_TIMEOUT_SECS: i64 = 30;
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "mousebot")]
#[command(about = "Counts the mice caught by humans and cats, per channel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config and MOUSEBOT_TOKEN)
    #[arg(short, long, global = true)]
    token: Option<String>,

    /// Only serve the debug channel (`testing` unless configured)
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Print a default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_bot(&cli.config, cli.token, cli.debug),
        Commands::Version => {
            println!("mousebot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: &str, token_override: Option<String>, debug: bool) -> Result<Config, BotError> {
    let mut config = if Path::new(path).exists() {
        Config::load(path)?
    } else {
        tracing::info!("No config at {}, using defaults and environment", path);
        Config::default()
    };

    config.apply_env();
    if let Some(token) = token_override {
        config.set_token(token);
    }
    if debug {
        config.debug.enabled = true;
    }
    config.validate()?;
    Ok(config)
}

fn build_dispatcher(config: &Config, counters: CounterBook, info: &BotInfo) -> MessageDispatcher {
    let dispatcher = MessageDispatcher::new(&config.bot.prefix, counters)
        .with_bot_username(&info.username)
        .with_middleware(LoggingMiddleware)
        .with_middleware(SelfMessageMiddleware::new(&info.id));

    if config.debug.enabled {
        tracing::info!("Debug mode: only serving channel `{}`", config.debug.channel);
        dispatcher.with_middleware(DebugChannelMiddleware::new(&config.debug.channel))
    } else {
        dispatcher
    }
}

fn run_bot(config_path: &str, token_override: Option<String>, debug: bool) -> Result<(), BotError> {
    let config = load_config(config_path, token_override, debug)?;
    tracing::info!("Starting {} (counts in {})", config.bot.name, config.storage.path.display());

    let store = JsonFileStore::new(&config.storage.path);
    let counters = CounterBook::open(Box::new(store))?;

    // One message at a time
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BotError::Internal(format!("Failed to start runtime: {}", e)))?;

    if let Some(token) = config.telegram_token() {
        let token = token.to_string();
        rt.block_on(async {
            let mut bot = TelegramAdapter::new(token);
            bot.fetch_bot_info().await?;

            if let Err(e) = bot.register_commands(&config.bot.prefix).await {
                tracing::warn!("Failed to register commands: {}", e);
            }

            let dispatcher = build_dispatcher(&config, counters, &bot.bot_info());
            run_telegram_bot(&bot, dispatcher).await
        })
    } else {
        rt.block_on(async {
            let bot = ConsoleAdapter::new();
            let dispatcher = build_dispatcher(&config, counters, &bot.bot_info());
            run_console_bot(&bot, dispatcher).await
        })
    }
}

async fn run_telegram_bot(bot: &TelegramAdapter, mut dispatcher: MessageDispatcher) -> Result<(), BotError> {
    bot.start().await?;

    let info = bot.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let mut offset: i64 = 0;

    tracing::info!("Starting message loop...");

    loop {
        let polled = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                return Ok(());
            }
            polled = bot.get_updates(offset, POLL_TIMEOUT_SECS) => polled,
        };

        match polled {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::debug!("Received {} updates", updates.len());
                }
                for update in &updates {
                    if let Some(message) = update.message.as_ref().and_then(TelegramAdapter::to_message) {
                        dispatcher.process(bot, message).await;
                    }
                }

                offset = TelegramAdapter::get_next_offset(&updates, offset);
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

async fn run_console_bot(bot: &ConsoleAdapter, mut dispatcher: MessageDispatcher) -> Result<(), BotError> {
    bot.start().await?;

    println!(
        "Type `{} help` to begin. Start a line with #name to talk in channel `name`. Ctrl-D quits.",
        dispatcher.prefix()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line.map_err(|e| BotError::Internal(format!("Failed to read stdin: {}", e)))?,
        };
        let Some(line) = line else { break };

        if let Some(message) = ConsoleAdapter::parse_line(&line) {
            dispatcher.process(bot, message).await;
        }
    }

    tracing::info!("Console closed, {} channel counter(s) saved", dispatcher.counters().len());
    Ok(())
}

fn init_config() -> Result<(), BotError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
