//! `emit` command implementation.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use contracts::{Event, ServerEvent, UserEvent};
use reporter::{ReporterSnapshot, ReportingClient, TcpTransport};

use super::load_blueprint;
use crate::cli::{EmitArgs, EventKind};

/// Execute the `emit` command
///
/// Records `count` events, then drops the client so the accumulator makes
/// its final flush, and waits for it.
pub async fn run_emit(args: &EmitArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");
    let mut blueprint = load_blueprint(&args.config)?;

    if let Some(ref server) = args.server {
        info!(server = %server, "Overriding collector address from CLI");
        blueprint.client.server_addr = server.clone();
    }

    let config = blueprint.client;
    let transport = TcpTransport::new(config.server_addr.clone());
    let (client, task) = ReportingClient::spawn(&config, transport, CancellationToken::new());

    for _ in 0..args.count {
        client.record(build_event(args));
        // Give the accumulator a chance to drain the queue
        tokio::task::yield_now().await;
    }

    let metrics = std::sync::Arc::clone(client.metrics());
    drop(client);
    task.await.context("Reporter task failed")?;

    let snapshot = metrics.snapshot();
    print_summary(&snapshot);

    check_delivery(&snapshot, &config.server_addr)
}

/// Fail unless every recorded event was accepted and delivered
fn check_delivery(snapshot: &ReporterSnapshot, server_addr: &str) -> Result<()> {
    if snapshot.dropped > 0 {
        warn!(
            dropped = snapshot.dropped,
            "Events dropped at the client queue"
        );
    }
    if snapshot.pending > 0 {
        warn!(pending = snapshot.pending, "Some events were not delivered");
    }

    if snapshot.dropped > 0 || snapshot.pending > 0 {
        anyhow::bail!(
            "{} event(s) dropped, {} event(s) not delivered to {}",
            snapshot.dropped,
            snapshot.pending,
            server_addr
        );
    }

    Ok(())
}

fn build_event(args: &EmitArgs) -> Event {
    let event: Event = match args.kind {
        EventKind::Server => ServerEvent::new(args.action.clone(), args.id.clone()).into(),
        EventKind::User => UserEvent::new(args.action.clone(), args.id.clone()).into(),
    };

    match args.account {
        Some(ref account) => event.with_account_id(account.clone()),
        None => event,
    }
}

fn print_summary(snapshot: &ReporterSnapshot) {
    println!("\n=== Reporter Statistics ===");
    println!("  Recorded: {}", snapshot.recorded);
    println!("  Dropped: {}", snapshot.dropped);
    println!(
        "  Flushes: {} ({} failed)",
        snapshot.flushes + snapshot.flush_failures,
        snapshot.flush_failures
    );
    println!("  Events sent: {}", snapshot.events_sent);
    println!("  Pending: {}", snapshot.pending);
}
