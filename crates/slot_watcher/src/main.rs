//! Entry point for the slot watcher process.
//!
//! Loads configuration, wires the browser client, session manager, scanner
//! and notification services together, and runs the scheduler until the
//! first slot is found and notified.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use browser_client::WebDriverFactory;
use notification_services::{EmailService, SendGridEmailService, SmsService, TwilioSmsService};
use slot_scan::{
    AppConfig, NotificationDispatcher, Recipients, Scheduler, SessionManager, SlotScanner,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🛒 Starting slot watcher...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Configuration error: {e}");
            return ExitCode::from(1);
        }
    };

    log::info!(
        "🔍 Scanning {} stores over {} delivery groups, every {:?}",
        config.locations.len(),
        config.delivery_slot_groups.len(),
        config.poll_interval
    );

    let mut scheduler = match build_scheduler(&config).await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            log::error!("❌ Failed to start: {e:#}");
            return ExitCode::from(1);
        }
    };

    match scheduler.run().await {
        Some(event) => {
            log::info!(
                "✅ {} slot found at {} on {}, notified, exiting",
                event.channel_label(),
                event.place(),
                event.date
            );
            ExitCode::SUCCESS
        }
        None => {
            log::info!("👋 Interrupted before any slot was found");
            ExitCode::from(130)
        }
    }
}

/// Wires all collaborators from the loaded configuration. Any failure here
/// is fatal: it happens before the first tick.
async fn build_scheduler(config: &AppConfig) -> anyhow::Result<Scheduler> {
    let site = config.site();

    let factory = WebDriverFactory::new(config.webdriver.clone());
    let session = SessionManager::new(
        Box::new(factory),
        config.credentials.clone(),
        site.clone(),
        None,
    )
    .await
    .context("failed to open a browser session")?;

    let scanner = SlotScanner::new(
        config.locations.clone(),
        config.window.clone(),
        config.delivery_slot_groups.clone(),
        site,
    );

    let sms: Arc<dyn SmsService> = Arc::new(
        TwilioSmsService::new(
            config.notify.twilio_account_sid.clone(),
            config.notify.twilio_auth_token.clone(),
            config.notify.twilio_from_number.clone(),
        )
        .context("failed to initialize the SMS service")?,
    );

    let email: Option<Arc<dyn EmailService>> = match &config.notify.sendgrid_api_key {
        Some(api_key) => Some(Arc::new(
            SendGridEmailService::new(api_key.clone(), config.notify.from_email.clone())
                .context("failed to initialize the email service")?,
        )),
        None => {
            log::warn!("📧 SENDGRID_API_KEY not set, email channel disabled");
            None
        }
    };

    let dispatcher = NotificationDispatcher::new(
        Some(sms),
        email,
        Recipients {
            phone_numbers: config.notify.phone_numbers.clone(),
            emails: config.notify.email_recipients.clone(),
        },
    );

    // Boot-time probe so a broken email provider shows up before the first
    // scan ever runs.
    dispatcher.notify_startup().await;

    Ok(Scheduler::new(
        config.poll_interval,
        session,
        scanner,
        dispatcher,
    ))
}
