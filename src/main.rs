use educloud::adapters::{FileSettingsStore, ReqwestHttpClient, TracingAuditLog};
use educloud::cli::{parse_args, run_cli_command, version_line, CliCommand};
use educloud::config::CloudConfig;
use educloud::reconcile::CloudContext;

use color_eyre::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber. `EDUCLOUD_LOG` takes `RUST_LOG` syntax.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("EDUCLOUD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn main() -> Result<()> {
    let command = parse_args(std::env::args());

    // Handle --version before any setup
    if command == CliCommand::Version {
        println!("{}", version_line());
        std::process::exit(0);
    }

    color_eyre::install()?;
    init_tracing();

    let config = CloudConfig::from_env();
    let http = ReqwestHttpClient::with_timeout(config.timeout())?;
    let store = FileSettingsStore::new(config.settings_dir.clone());
    let ctx = CloudContext::new(
        Arc::new(http),
        Arc::new(store),
        Arc::new(TracingAuditLog::new()),
        config,
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let exit_code = runtime.block_on(run_cli_command(command, &ctx));
    std::process::exit(exit_code)
}
