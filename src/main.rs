//! bluempris daemon - exposes Bluetooth media players over MPRIS.

use std::error::Error;

use bluempris::{
    cli::{Cli, Command},
    config::Config,
    services::{
        bluez::BluezEnumerator,
        bridge::{BluezSessionFactory, Reconciler, SessionRegistry, snapshot_players},
        desktop::DesktopIntegration,
    },
    tracing_config,
};
use clap::Parser;
use tracing::{Instrument, info, info_span, warn};
use zbus::Connection;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.do_nothing {
        return Ok(());
    }

    if cli.command() == Command::Schema {
        println!("{}", Config::json_schema()?);
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let _guard = tracing_config::init(
        cli.log_level.unwrap_or(config.general.log_level),
        config.general.log_format,
        config.general.log_to_file,
    )?;

    match cli.command() {
        Command::List => list(&config).await,
        Command::Run | Command::Schema => run(config).await,
    }
}

async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    info!("Starting Bluetooth MPRIS bridge");

    let system = Connection::system().await?;
    let hooks = DesktopIntegration::new(config.desktop.clone())?;
    info!(
        dir = %hooks.applications_dir().display(),
        enabled = config.desktop.entries,
        "Desktop integration configured"
    );

    let reconciler = Reconciler::new(
        BluezEnumerator::new(system.clone()),
        BluezSessionFactory::new(system, config.bridge.session_settings()),
        hooks,
        SessionRegistry::new(),
    );

    reconciler
        .run(config.bridge.poll_interval(), shutdown_signal())
        .instrument(info_span!("bridge"))
        .await;

    info!("Bridge stopped");
    Ok(())
}

async fn list(config: &Config) -> Result<(), Box<dyn Error>> {
    let system = Connection::system().await?;
    let enumerator = BluezEnumerator::new(system.clone());

    let snapshots =
        snapshot_players(&system, &enumerator, &config.bridge.session_settings()).await?;

    if snapshots.is_empty() {
        println!("No Bluetooth media players found");
    }
    for snapshot in snapshots {
        print!("{snapshot}");
    }

    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}
