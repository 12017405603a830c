use dotenvy::dotenv;
use ledger_sync::auth::{GoogleIdentity, SessionCache};
use ledger_sync::config;
use ledger_sync::controller::AppController;
use ledger_sync::errors::{Error, Result};
use ledger_sync::ledger::LedgerClient;
use ledger_sync::store::SheetsStore;
use ledger_sync::util::format_currency;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// Single-threaded by design: every operation is one non-blocking request at
// a time, so the current-thread runtime is all the binary needs.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()?;
    info!(
        "Targeting spreadsheet {} for year {}",
        app_config.spreadsheet_id, app_config.year
    );

    // 4. Wire the store, identity provider, and controller together
    let store = SheetsStore::new(app_config.spreadsheet_id.clone());
    let ledger = LedgerClient::with_year(store, app_config.year);
    let cache = SessionCache::new(config::SESSION_CACHE_FILE.into());
    let mut app = AppController::new(ledger, GoogleIdentity::new(), cache);
    app.restore_profile();

    // 5. The consent flow happens in a browser, outside this process; the
    // issued access token is handed in via the environment, directly before
    // use, never stored in configuration.
    let token = env::var("LEDGER_ACCESS_TOKEN").map_err(|_| Error::Config {
        message: "LEDGER_ACCESS_TOKEN not set".to_string(),
    })?;
    app.sign_in(token).await;

    if let Some(err) = app.error() {
        error!("{}", err.message);
        return Ok(());
    }

    // 6. Print the current month's ledger
    println!("{} {}", app.month(), app_config.year);
    for c in app.contributions() {
        println!(
            "{:<12} {:<28} {:>12}  {}",
            c.user_name,
            c.user_email,
            format_currency(c.amount),
            c.note
        );
    }
    println!("Total: {}", format_currency(app.total()));

    Ok(())
}
