// greeting-sdk/src/main.rs
// Greeting load driver - fires blocking and asynchronous requests at the
// greeting service and reports how many came back good.

use anyhow::Context;
use clap::Parser;

use greeting_sdk::config::DEFAULT_PROVIDER;
use greeting_sdk::{DispatchPlan, DriverConfig};

/// Exercise the greeting service with concurrent sync and async calls
#[derive(Debug, Parser)]
#[command(name = "greeting-driver", version, about)]
struct Cli {
    /// Number of blocking requests to launch
    #[arg(default_value_t = 50)]
    sync_count: usize,

    /// Number of asynchronous requests to launch
    #[arg(default_value_t = 50)]
    async_count: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    let config = DriverConfig::from_provider(&**DEFAULT_PROVIDER).context("Failed to load driver configuration")?;
    log::debug!("Driver configuration: {:?}", config);

    let plan = DispatchPlan::from_config(cli.sync_count, cli.async_count, &config);
    let report = greeting_sdk::run(&config, &plan)
        .await
        .with_context(|| format!("Dispatch against {} failed", config.service.base_url))?;

    for line in report.summary.to_string().lines() {
        log::info!("{}", line);
    }

    Ok(())
}
