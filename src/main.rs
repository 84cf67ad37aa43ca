// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::rolling_file::{
        policy::compound::{
            roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger, CompoundPolicy,
        },
        RollingFileAppender,
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion_sync::config::resolve_log_level;
use notion_sync::store::{StoreStats, SyncEventRow, SyncRunRow};
use notion_sync::{
    AppConfig, Cli, Command, NotionGateway, NotionHttpClient, RetryPolicy, Store, SyncArgs,
    SyncEngine,
};
use std::fs;
use std::path::Path;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {M} - {m}{n}";
const LOG_FILE_MAX_BYTES: u64 = 5 * 1024 * 1024;
const LOG_FILE_ARCHIVES: u32 = 5;

/// Sets up console, app.log and error.log output.
fn setup_logging(log_dir: &Path, level: LevelFilter) -> anyhow::Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let app_log = rolling_appender(log_dir, "app")?;
    let error_log = rolling_appender(log_dir, "error")?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(Appender::builder().build("app", Box::new(app_log)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Warn)))
                .build("error", Box::new(error_log)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("app")
                .appender("error")
                .build(level),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log directory: {}", log_dir.display());
    Ok(())
}

fn rolling_appender(log_dir: &Path, name: &str) -> anyhow::Result<RollingFileAppender> {
    let archive_pattern = log_dir.join(format!("{}.{{}}.log", name));
    let roller = FixedWindowRoller::builder()
        .build(&archive_pattern.to_string_lossy(), LOG_FILE_ARCHIVES)?;
    let policy = CompoundPolicy::new(
        Box::new(SizeTrigger::new(LOG_FILE_MAX_BYTES)),
        Box::new(roller),
    );
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(log_dir.join(format!("{}.log", name)), Box::new(policy))?)
}

async fn run_sync(config: &AppConfig, store: &Store, args: &SyncArgs) -> anyhow::Result<()> {
    let options = args.options()?;
    let api_key = config.api_key()?;
    let client = NotionHttpClient::new(&api_key, config.request_timeout)?;
    let gateway = NotionGateway::with_retry_policy(
        client,
        RetryPolicy::default().with_max_attempts(config.retry_max),
    );

    let engine = SyncEngine::new(&config.databases, &gateway, store);
    let stats = engine.run(&options).await.context("sync failed")?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn print_stats(stats: &StoreStats, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }
    if stats.records.is_empty() {
        println!("Store is empty. Run `notion-sync sync` first.");
        return Ok(());
    }
    println!("{:<24} {:>10} {:>10}", "database", "records", "relations");
    for (logical_db, records) in &stats.records {
        let relations = stats.relations.get(logical_db).copied().unwrap_or(0);
        println!("{:<24} {:>10} {:>10}", logical_db, records, relations);
    }
    Ok(())
}

fn print_runs(runs: &[SyncRunRow]) {
    for run in runs {
        println!(
            "#{:<5} {:<10} {}  {} -> {}  records={} relations={} changed={}  {}",
            run.run_id,
            run.status,
            if run.incremental { "incremental" } else { "full" },
            run.started_at,
            run.finished_at.as_deref().unwrap_or("-"),
            run.record_count,
            run.relation_count,
            run.changed_count,
            run.summary
        );
    }
}

fn print_events(events: &[SyncEventRow]) {
    for event in events {
        let scope = if event.logical_db.is_empty() {
            "-"
        } else {
            event.logical_db.as_str()
        };
        println!(
            "{} [{}] {} {}: {}",
            event.created_at, event.status, event.step, scope, event.message
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)?;
    let level = resolve_log_level(cli.log_level.as_deref(), config.log_level.as_deref())?;
    let log_dir = cli.log_dir.clone().unwrap_or_else(|| config.log_dir.clone());
    setup_logging(&log_dir, level)?;

    let store = Store::open(&config.store_path)
        .with_context(|| format!("opening store {}", config.store_path.display()))?;

    match &cli.command {
        Command::Sync(args) => run_sync(&config, &store, args).await?,
        Command::Stats { json } => print_stats(&store.stats()?, *json)?,
        Command::Runs { limit, offset } => print_runs(&store.list_sync_runs(*limit, *offset)?),
        Command::Events {
            run_id,
            step,
            limit,
        } => {
            if store.get_sync_run(*run_id)?.is_none() {
                return Err(notion_sync::AppError::RunNotFound { run_id: *run_id }.into());
            }
            print_events(&store.list_sync_events(*run_id, step.as_deref(), *limit)?);
        }
    }

    Ok(())
}
