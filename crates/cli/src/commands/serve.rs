//! `serve` command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use collector::{serve, Collector, CollectorBuilder};
use contracts::ReportingBlueprint;

use super::load_blueprint;
use crate::cli::ServeArgs;

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");
    let mut blueprint = load_blueprint(&args.config)?;

    if let Some(ref listen) = args.listen {
        info!(listen = %listen, "Overriding listen address from CLI");
        blueprint.server.listen_addr = listen.clone();
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    print_config_summary(&blueprint);

    let collector = CollectorBuilder::new(blueprint.sinks.clone())
        .build()
        .await
        .context("Failed to create sinks")?;
    let collector = Arc::new(collector);

    let listener = TcpListener::bind(&blueprint.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", blueprint.server.listen_addr))?;

    let cancel = CancellationToken::new();
    let shutdown = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            setup_shutdown_signal().await;
            warn!("Received shutdown signal, stopping collector...");
            cancel.cancel();
        })
    };

    serve(listener, Arc::clone(&collector), cancel)
        .await
        .context("Collector listener failed")?;
    shutdown.abort();

    print_summary(&collector);

    match Arc::try_unwrap(collector) {
        Ok(collector) => collector.shutdown().await,
        Err(_) => warn!("Collector still shared, sinks not closed"),
    }

    info!("Collector finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn print_config_summary(blueprint: &ReportingBlueprint) {
    println!("\n=== Collector ===");
    println!("  Listen: {}", blueprint.server.listen_addr);
    println!("  Sinks: {}", blueprint.sinks.len());
    for sink in &blueprint.sinks {
        println!("    - {} ({:?})", sink.name, sink.sink_type);
    }
    println!();
}

fn print_summary(collector: &Collector) {
    let stats = collector.stats();

    println!("\n=== Collector Statistics ===");
    println!("  Batches accepted: {}", stats.batches_accepted);
    println!("  Batches rejected: {}", stats.batches_rejected);
    println!("  Batches with sink failures: {}", stats.batches_failed);
    println!("  Events accepted: {}", stats.events_accepted);

    let sinks = collector.metrics();
    if !sinks.is_empty() {
        println!("\n  Sinks:");
        for (name, snapshot) in sinks {
            println!(
                "    {}: {} puts, {} events, {} failures",
                name, snapshot.put_count, snapshot.event_count, snapshot.failure_count
            );
        }
    }
}
