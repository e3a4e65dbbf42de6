use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use snooze_bro::badge::{BadgeCounter, TerminalBadge};
use snooze_bro::browser::{FixedTabs, UrlFilter};
use snooze_bro::config::{self, Config};
use snooze_bro::messaging::{spawn_background, BackgroundHandle, Message, Messenger};
use snooze_bro::notify::{self, TerminalNotifier};
use snooze_bro::output;
use snooze_bro::snooze::{SnoozeRecord, SnoozeRegistry};
use snooze_bro::store::Stores;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_NOT_FOUND: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// List snoozes sorted by wake-up time (default if no subcommand)
    List,
    /// Snooze a URL
    Add {
        url: String,
        /// How long to snooze, e.g. "2h", "3days", "1week"
        #[arg(value_parser = humantime::parse_duration)]
        duration: Duration,
        /// Explicit id (defaults to the current time in milliseconds)
        #[arg(long)]
        id: Option<String>,
        /// Do not count this snooze on the badge
        #[arg(long)]
        no_badge: bool,
    },
    /// Remove a snooze by id
    Remove { id: String },
    /// Push an existing snooze's wake-up time to now + duration
    Update {
        id: String,
        #[arg(value_parser = humantime::parse_duration)]
        duration: Duration,
    },
    /// Check whether a URL (or a page above or below it) is snoozed
    Check { url: String },
    /// List snoozes that are due, optionally showing a notification for each
    Due {
        #[arg(long = "notify")]
        announce: bool,
    },
    /// Show the badge
    Badge,
    /// Reset the badge counter from the snooze list
    Reconcile,
    /// Open a snoozed page in the browser by id
    Open { id: String },
    /// Resolve the active tab URL through the background worker
    Current {
        /// URL of the active tab
        url: String,
    },
    /// Wipe both local and sync stores
    Clear,
    /// Write a default config file
    Init,
}

#[derive(Parser, Debug)]
#[command(name = "snooze-bro")]
#[command(about = "Snooze URLs until later", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/snooze-bro/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// User whose list to act on (overrides the config)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Everything a command needs, wired from the config
struct App {
    config: Config,
    user: String,
    stores: Stores,
    registry: SnoozeRegistry,
    background: BackgroundHandle,
    use_colors: bool,
}

impl App {
    fn build(config: Config, user: String, tab_url: Option<String>) -> Result<Self> {
        let data_dir = config::get_data_dir(&config)?;
        tracing::debug!(data_dir = %data_dir.display(), "opening stores");
        let stores = Stores::disk(&data_dir);
        let use_colors = output::should_use_colors();

        let counter = Arc::new(BadgeCounter::new(
            stores.sync.clone(),
            Arc::new(TerminalBadge::new(use_colors)),
            config.badge_color.clone(),
        ));
        let filter = UrlFilter::new(config.allowed_urls.as_slice())?;
        let (background, _worker) =
            spawn_background(counter.clone(), Arc::new(FixedTabs::new(tab_url)), filter);
        let registry = SnoozeRegistry::new(
            stores.sync.clone(),
            counter,
            Arc::new(background.clone()),
        );

        Ok(Self {
            config,
            user,
            stores,
            registry,
            background,
            use_colors,
        })
    }

    async fn find(&self, id: &str) -> Result<Option<SnoozeRecord>> {
        let list = self.registry.get_list(&self.user).await?;
        Ok(list.into_iter().find(|r| r.id == id))
    }
}

fn wake_at(duration: Duration) -> Result<i64> {
    let delta = chrono::Duration::from_std(duration).context("Snooze duration is too long")?;
    Ok((Utc::now() + delta).timestamp_millis())
}

#[derive(Debug)]
struct NotFound(String);

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No snooze with id {}", self.0)
    }
}

impl std::error::Error for NotFound {}

async fn run(app: &App, command: Commands) -> Result<()> {
    let user = app.user.as_str();
    let now = Utc::now();

    match command {
        Commands::List => {
            let list = app.registry.get_list(user).await?;
            println!(
                "{}",
                output::format_snooze_table(&list, now, app.use_colors)
            );
        }
        Commands::Add {
            url,
            duration,
            id,
            no_badge,
        } => {
            let id = id.unwrap_or_else(|| now.timestamp_millis().to_string());
            let record = SnoozeRecord::new(id, url, wake_at(duration)?).with_badge(!no_badge);
            let list = app.registry.snooze(user, record).await?;
            println!(
                "{}",
                output::format_snooze_table(&list, now, app.use_colors)
            );
        }
        Commands::Remove { id } => {
            if app.find(&id).await?.is_none() {
                return Err(NotFound(id).into());
            }
            let list = app.registry.remove(user, &id).await?;
            println!(
                "{}",
                output::format_snooze_table(&list, now, app.use_colors)
            );
        }
        Commands::Update { id, duration } => {
            let mut record = app.find(&id).await?.ok_or(NotFound(id))?;
            record.notify_at = wake_at(duration)?;
            let list = app.registry.update(user, record).await?;
            println!(
                "{}",
                output::format_snooze_table(&list, now, app.use_colors)
            );
        }
        Commands::Check { url } => {
            let snoozed = app.registry.is_url_snoozed(user, &url).await?;
            println!("{}", if snoozed { "snoozed" } else { "not snoozed" });
        }
        Commands::Due { announce } => {
            let due = app.registry.due(user, now.timestamp_millis()).await?;
            if announce {
                let notifier = TerminalNotifier {
                    use_colors: app.use_colors,
                };
                notify::announce(&notifier, &due, &app.config.notification_icon).await?;
            } else {
                println!(
                    "{}",
                    output::format_snooze_table(&due, now, app.use_colors)
                );
            }
        }
        Commands::Badge => {
            app.registry.counter().refresh_indicator().await?;
        }
        Commands::Reconcile => {
            let count = app.registry.reconcile_badge(user).await?;
            println!("Badge count reset to {}", count);
        }
        Commands::Open { id } => {
            let record = app.find(&id).await?.ok_or(NotFound(id))?;
            snooze_bro::browser::open_url(&record.url)?;
            println!(
                "{}",
                output::format_snooze_detail(&record, now, app.use_colors)
            );
        }
        Commands::Current { .. } => {
            let reply = app.background.send(Message::GetCurrentTabUrl).await?;
            match reply.as_str() {
                Some(url) => {
                    let snoozed = app.registry.is_url_snoozed(user, url).await?;
                    println!("{} ({})", url, if snoozed { "snoozed" } else { "not snoozed" });
                }
                None => println!("Active tab cannot be snoozed"),
            }
        }
        Commands::Clear => {
            app.stores.clear_all().await?;
            println!("Cleared local and sync stores");
        }
        Commands::Init => anyhow::bail!("init runs before the stores are opened"),
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = snooze_bro::logging::init(cli.verbose) {
        eprintln!("{:#}", e);
        std::process::exit(EXIT_FAILURE);
    }

    let command = cli.command.unwrap_or(Commands::List);
    let config_path = cli.config.map(PathBuf::from);

    if matches!(command, Commands::Init) {
        let path = match config_path.map(Ok).unwrap_or_else(config::get_config_path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Config error: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        };
        if path.exists() {
            eprintln!("Config already exists at {}", path.display());
            std::process::exit(EXIT_CONFIG);
        }
        if let Err(e) = config::save_config(&path, &Config::default()) {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        println!("Config written to {}", path.display());
        std::process::exit(EXIT_SUCCESS);
    }

    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    let user = cli.user.unwrap_or_else(|| config.user.clone());
    let tab_url = match &command {
        Commands::Current { url } => Some(url.clone()),
        _ => None,
    };

    let app = match App::build(config, user, tab_url) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(e) = run(&app, command).await {
        eprintln!("Error: {:#}", e);
        let code = if e.downcast_ref::<NotFound>().is_some() {
            EXIT_NOT_FOUND
        } else {
            EXIT_FAILURE
        };
        std::process::exit(code);
    }

    std::process::exit(EXIT_SUCCESS);
}
