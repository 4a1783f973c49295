//! Entry point for the stattop display. Parses args, resolves the agent, and runs the App.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use stattop::app::{App, Settings};
use stattop::cli::{agent_url, Cli};
use stattop::ws::WsSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout belongs to the table
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let target = cli.resolve_target()?;
    let url = agent_url(&target)?;

    if cli.dry_run {
        println!("agent: {url}");
        if let Some(ca) = target.tls_ca.as_deref() {
            println!("tls-ca: {ca}");
        }
        println!("containers: {}", cli.sorted_containers().join(" "));
        return Ok(());
    }

    let source = Arc::new(WsSource::new(
        url,
        target.tls_ca.map(PathBuf::from),
        target.token,
    ));
    let app = App::with_settings(source, Settings::from_env());
    tokio::select! {
        res = app.run(&cli.containers, io::stdout()) => res?,
        _ = tokio::signal::ctrl_c() => {}
    }
    Ok(())
}
