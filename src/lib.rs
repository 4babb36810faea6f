pub mod config;
pub mod control;
pub mod db;
pub mod reminders;
pub mod scheduler;
mod utils;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::warn;

use config::{Config, MailConfig};
use db::Database;
use reminders::{EmailNotifier, HttpMailTransport, LogTransport, MailTransport, ReminderSweep};
use scheduler::ReminderScheduler;

/// Everything a process needs after reading its configuration.
pub struct AppState {
    pub config: Config,
    pub db: Database,
}

impl AppState {
    pub fn open(config: Config) -> Result<Self> {
        let db = Database::new(config.database_path.clone()).with_context(|| {
            format!(
                "failed to open database at {}",
                config.database_path.display()
            )
        })?;
        Ok(Self { config, db })
    }

    pub fn build_sweep(&self) -> Result<ReminderSweep> {
        let transport = build_transport(&self.config.mail)?;
        let notifier = Arc::new(EmailNotifier::new(self.db.clone(), transport));
        Ok(ReminderSweep::new(Arc::new(self.db.clone()), notifier)
            .with_dashboard_url(self.config.dashboard_url.clone()))
    }

    pub fn build_scheduler(&self) -> Result<ReminderScheduler> {
        ReminderScheduler::new(
            self.build_sweep()?,
            self.config.check_interval_ms,
            self.config.lookahead_minutes,
        )
    }
}

pub fn build_transport(mail: &MailConfig) -> Result<Arc<dyn MailTransport>> {
    match &mail.api_url {
        Some(api_url) => {
            if mail.api_key.is_none() {
                warn!("Mail API configured without an API key; requests will be unauthenticated");
            }
            let transport = HttpMailTransport::new(
                api_url.clone(),
                mail.api_key.clone(),
                mail.from.clone(),
                Duration::from_secs(mail.timeout_secs),
            )?;
            Ok(Arc::new(transport))
        }
        None => {
            warn!("No mail API configured; reminders will only be logged");
            Ok(Arc::new(LogTransport))
        }
    }
}

pub fn init_logging(debug: bool) {
    // RUST_LOG still wins over the default level
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
