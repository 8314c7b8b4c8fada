use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use pongo_core::dispatch::dispatch_raw;
use pongo_core::ids::sort_most_recent_first;
use pongo_core::store::ChatStore;
use pongo_core::OutboundRequest;
use serde_json::json;

#[derive(Debug, Parser)]
#[command(name = "pongo")]
#[command(about = "Offline tools for the pongo chat state engine")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a JSONL file of subscription events and print the resulting state
    Replay {
        /// Our own ship, with or without the sigil
        #[arg(long, env = "PONGO_SHIP")]
        ship: String,

        /// Treat this conversation as open while replaying
        #[arg(long)]
        focus: Option<String>,

        /// Events file, one JSON event per line ("-" for stdin)
        events: PathBuf,
    },

    /// Sort message ids most recent first
    Order {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.cmd {
        Command::Replay {
            ship,
            focus,
            events,
        } => cmd_replay(ship, focus.as_deref(), events),
        Command::Order { ids } => cmd_order(ids),
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn print(v: serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&v).context("json encode")?);
    Ok(())
}

fn open_events(path: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("open events file {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ReplayReport {
    applied: usize,
    rejected: usize,
    outbound: Vec<OutboundRequest>,
}

fn replay(
    store: &mut ChatStore,
    focus: Option<&str>,
    lines: impl Iterator<Item = std::io::Result<String>>,
) -> anyhow::Result<ReplayReport> {
    let mut report = ReplayReport::default();
    for (n, line) in lines.enumerate() {
        let line = line.with_context(|| format!("read line {}", n + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        // The focused chat may only exist after a conversation list arrives.
        if let Some(cid) = focus {
            if !store.is_focused(cid) && store.chat(cid).is_some() {
                store.focus(cid)?;
            }
        }
        match dispatch_raw(store, &line) {
            Ok(dispatched) => {
                report.applied += 1;
                report.outbound.extend(dispatched.outbound);
            }
            Err(rejection) => {
                tracing::warn!(line = n + 1, %rejection, "event rejected");
                report.rejected += 1;
            }
        }
    }
    Ok(report)
}

// ── Commands ────────────────────────────────────────────────────────────────

fn cmd_replay(ship: &str, focus: Option<&str>, events: &Path) -> anyhow::Result<()> {
    let mut store = ChatStore::new(ship);
    let report = replay(&mut store, focus, open_events(events)?.lines())?;

    let open = focus.and_then(|cid| store.chat(cid));
    print(json!({
        "applied": report.applied,
        "rejected": report.rejected,
        "outbound": report.outbound.iter().map(|r| r.tag()).collect::<Vec<_>>(),
        "total_unreads": store.total_unreads(),
        "chats": store.summaries(),
        "messages": open.map(|chat| &chat.messages),
    }))
}

fn cmd_order(ids: &[String]) -> anyhow::Result<()> {
    let mut ids = ids.to_vec();
    sort_most_recent_first(&mut ids, |id| id.as_str());
    print(json!(ids))
}
