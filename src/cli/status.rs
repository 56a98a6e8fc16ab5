//! Status command - cache, breaker, router, and experiment state

use crate::cli::wiring;
use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Print the system status snapshot as pretty JSON
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let gateway = wiring::build_gateway(&config)?;
    let status = gateway.system_status()?;

    println!("{}", serde_json::to_string_pretty(&status)?);

    Ok(())
}
