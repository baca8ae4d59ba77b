use clap::Parser;
use infrastructure::config::Config;
use presentation::cli::{Cli, CliApp};
use shared::telemetry::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load().with_overrides(cli.api_key.clone(), cli.model.clone());
    let mut app = CliApp::new(&cli, config)?;
    app.run(cli).await?;
    Ok(())
}
