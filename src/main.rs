use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use syncplan::account::{AccountManager, SettingsUpdate};
use syncplan::config::Config;
use syncplan::scheduler::{LoggingPushChannel, LoggingScheduler};
use syncplan::settings::{AccountSyncConfig, AccountType, IntervalField, SyncMode};
use syncplan::store::SqliteStore;

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,syncplan=debug"));

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .ok()
        .map(|dir| dir.join("syncplan.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        // Log to file
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"syncplan - per-account mail sync and cleanup settings

Usage: syncplan <command> [args]

Commands:
    list                            List configured accounts
    show <account>                  Show an account's sync settings
    add <account> [type]            Add an account (type: exchange | imap | pop3)
    remove <account>                Remove an account
    set <account> <setting> <value> Change a setting and replan sync
    help                            Show this help message

Settings:
    sync-mode        push | scheduled | manual   (Exchange accounts)
    sync-interval    1 | 2 | 3 | 5 | 10 | 15 | 30   (minutes)
    night-mode       on | off
    battery-saver    on | off   (on = keep syncing under battery saver)
    contacts-days, notes-days, calendar-days, tasks-days
                     days between PIM syncs, 0 disables (Exchange accounts)
    trash-days, drafts-days, spam-days
                     auto-cleanup retention in days, 0 disables

Configuration file: ~/.config/syncplan/config.toml
"#
    );
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        _ => anyhow::bail!("expected on|off, got '{}'", raw),
    }
}

fn parse_update(setting: &str, value: &str) -> Result<SettingsUpdate> {
    let update = match setting {
        "sync-mode" => SettingsUpdate::SyncMode(SyncMode::parse(value)?),
        "sync-interval" => SettingsUpdate::SyncIntervalMinutes(
            value
                .parse()
                .with_context(|| format!("invalid interval '{}'", value))?,
        ),
        "night-mode" => SettingsUpdate::NightModeEnabled(parse_bool(value)?),
        "battery-saver" => SettingsUpdate::IgnoreBatterySaver(parse_bool(value)?),
        _ => {
            let field = match setting {
                "contacts-days" => IntervalField::Contacts,
                "notes-days" => IntervalField::Notes,
                "calendar-days" => IntervalField::Calendar,
                "tasks-days" => IntervalField::Tasks,
                "trash-days" => IntervalField::CleanupTrash,
                "drafts-days" => IntervalField::CleanupDrafts,
                "spam-days" => IntervalField::CleanupSpam,
                _ => anyhow::bail!("unknown setting '{}'", setting),
            };
            let days = value
                .parse()
                .with_context(|| format!("invalid day count '{}'", value))?;
            SettingsUpdate::IntervalDays(field, days)
        }
    };
    Ok(update)
}

async fn open_manager(config: &Config) -> Result<AccountManager> {
    let db_path = config.database_path()?;
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
    }

    let store = SqliteStore::open(&db_path).await?;

    Ok(AccountManager::new(
        Arc::new(store),
        Arc::new(LoggingPushChannel),
        Arc::new(LoggingScheduler),
        config.retry.clone(),
    ))
}

fn print_summary(account: &AccountSyncConfig) {
    let interval = if account.interval_applicable() {
        format!("every {} min", account.sync_interval_minutes)
    } else {
        account.sync_mode.label().to_lowercase()
    };
    println!(
        "{:<32} {:<9} {:<14} night mode {}",
        account.account_id,
        account.account_type.label(),
        interval,
        if account.night_mode_enabled { "on" } else { "off" },
    );
}

fn print_details(account: &AccountSyncConfig) {
    println!("Account:              {}", account.account_id);
    println!("Type:                 {}", account.account_type.label());
    if account.account_type == AccountType::Exchange {
        println!("Sync mode:            {}", account.sync_mode.label());
    }
    if account.interval_applicable() {
        println!(
            "Sync interval:        every {} min",
            account.sync_interval_minutes
        );
    }
    println!(
        "Night mode:           {}",
        if account.night_mode_enabled { "on" } else { "off" }
    );
    println!(
        "Ignore battery saver: {}",
        if account.ignore_battery_saver { "on" } else { "off" }
    );
    for field in IntervalField::ALL {
        if field.exchange_only() && account.account_type != AccountType::Exchange {
            continue;
        }
        let days = account.interval_days(field);
        let cadence = if days == 0 {
            "disabled".to_string()
        } else {
            format!("every {} day(s)", days)
        };
        println!("{:<22}{}", format!("{}:", field.label()), cadence);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    match command {
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "list" => {
            let config = Config::load()?;
            let manager = open_manager(&config).await?;
            let accounts = manager.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts configured. Add one with: syncplan add <account> [type]");
            }
            for account in &accounts {
                print_summary(account);
            }
            Ok(())
        }
        "show" => {
            let Some(account_id) = args.get(2) else {
                print_usage();
                std::process::exit(1);
            };
            let config = Config::load()?;
            let manager = open_manager(&config).await?;
            let account = manager
                .get_account(account_id)
                .await?
                .with_context(|| format!("unknown account: {}", account_id))?;
            print_details(&account);
            Ok(())
        }
        "add" => {
            let Some(account_id) = args.get(2) else {
                print_usage();
                std::process::exit(1);
            };
            let account_type = match args.get(3) {
                Some(raw) => AccountType::parse(raw)?,
                None => AccountType::default(),
            };
            let config = Config::load()?;
            config.ensure_dirs()?;
            let manager = open_manager(&config).await?;
            let account = manager.create_account(account_id, account_type).await?;
            println!(
                "Added {} account '{}'",
                account.account_type.label(),
                account.account_id
            );
            Ok(())
        }
        "remove" => {
            let Some(account_id) = args.get(2) else {
                print_usage();
                std::process::exit(1);
            };
            let config = Config::load()?;
            let mut manager = open_manager(&config).await?;
            manager.remove_account(account_id).await?;
            println!("Removed account '{}'", account_id);
            Ok(())
        }
        "set" => {
            let (Some(account_id), Some(setting), Some(value)) =
                (args.get(2), args.get(3), args.get(4))
            else {
                print_usage();
                std::process::exit(1);
            };
            let update = parse_update(setting, value)?;
            let config = Config::load()?;
            let mut manager = open_manager(&config).await?;
            let updated = manager.update(account_id, update).await?;
            println!("Updated '{}':", account_id);
            print_details(&updated);
            manager.shutdown().await;
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}\n", other);
            print_usage();
            std::process::exit(1);
        }
    }
}
