use clap::Parser;
use pizzeria::{Application, Config, config::Args, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid");
        return Ok(());
    }

    telemetry::init_telemetry()?;

    let app = Application::new(config).await?;
    app.serve(async {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Received shutdown signal");
    })
    .await?;

    Ok(())
}
