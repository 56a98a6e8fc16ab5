//! Ask command - one question through the full gateway pipeline

use clap::Args;
use tracing::info;
use uuid::Uuid;

use crate::cli::wiring;
use crate::config::AppConfig;
use crate::infrastructure::logging;

#[derive(Args)]
pub struct AskArgs {
    /// Question to send through the gateway
    pub message: String,

    /// Session id; omit to start a fresh conversation
    #[arg(long)]
    pub session: Option<String>,
}

/// Run one request and print the reply
pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let session_id = args
        .session
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let gateway = wiring::build_gateway(&config)?;

    info!(session_id = %session_id, "submitting question");
    let outcome = gateway.submit(&session_id, &args.message, None).await?;

    println!("{}", outcome.response_text);

    Ok(())
}
