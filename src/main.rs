use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use studyblock_lib::{
    config::Config,
    control::{self, ControlState},
    db::NewStudyBlock,
    init_logging, scheduler, AppState,
};

#[derive(Parser)]
#[command(name = "studyblock", version, about = "Email reminders for upcoming study blocks")]
struct Cli {
    /// JSON config file; STUDYBLOCK_* environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the reminder scheduler until interrupted
    Serve,
    /// Run a single reminder sweep and print the result
    Sweep {
        /// Minutes ahead of now to look for starting blocks
        #[arg(long)]
        lookahead: Option<i64>,
    },
    /// Manage study blocks
    #[command(subcommand)]
    Block(BlockCommand),
    /// Manage reminder addresses
    #[command(subcommand)]
    Contact(ContactCommand),
}

#[derive(Subcommand)]
enum BlockCommand {
    /// Schedule a new study block
    Add {
        #[arg(long)]
        user: String,
        /// RFC 3339 start time, e.g. 2026-03-01T14:00:00Z
        #[arg(long, value_parser = parse_timestamp)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_timestamp)]
        end: DateTime<Utc>,
    },
    List {
        #[arg(long)]
        user: Option<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand)]
enum ContactCommand {
    /// Set the email address reminders are sent to
    Set {
        #[arg(long)]
        user: String,
        #[arg(long)]
        email: String,
    },
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("expected an RFC 3339 timestamp: {err}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    init_logging(config.debug);

    let app = AppState::open(config)?;

    match cli.command {
        Command::Serve => serve(app).await,
        Command::Sweep { lookahead } => {
            let lookahead = lookahead.unwrap_or(app.config.lookahead_minutes);
            let result = app.build_sweep()?.run_sweep(lookahead).await?;
            print_json(&result)
        }
        Command::Block(BlockCommand::Add { user, start, end }) => {
            let block = app
                .db
                .create_study_block(
                    NewStudyBlock {
                        user_id: user,
                        start_time: start,
                        end_time: end,
                    },
                    Utc::now(),
                )
                .await?;
            print_json(&block)
        }
        Command::Block(BlockCommand::List { user }) => {
            let blocks = app.db.list_study_blocks(user.as_deref()).await?;
            print_json(&blocks)
        }
        Command::Block(BlockCommand::Delete { id }) => {
            if !app.db.delete_study_block(&id).await? {
                anyhow::bail!("no study block with id {id}");
            }
            println!("Deleted study block {id}");
            Ok(())
        }
        Command::Contact(ContactCommand::Set { user, email }) => {
            let contact = app.db.upsert_contact(&user, &email, Utc::now()).await?;
            print_json(&contact)
        }
    }
}

async fn serve(app: AppState) -> Result<()> {
    info!("Study block reminders starting up...");

    let scheduler = scheduler::get_or_install(|| app.build_scheduler())?;
    scheduler.start().await;

    let shutdown = CancellationToken::new();
    let control_task = match app.config.control.bind.clone() {
        Some(bind) => {
            if app.config.control.secret.is_none() {
                warn!("Control API has no secret configured; every request will be rejected");
            }
            let state = ControlState::new(scheduler.clone(), app.config.control.secret.clone());
            let token = shutdown.clone();
            Some(tokio::spawn(async move {
                if let Err(err) = control::serve(&bind, state, token).await {
                    error!("Control API stopped: {err:#}");
                }
            }))
        }
        None => None,
    };

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    shutdown.cancel();
    scheduler.stop().await;
    if let Some(task) = control_task {
        if let Err(err) = task.await {
            error!("Control API task failed to join: {err}");
        }
    }

    Ok(())
}
