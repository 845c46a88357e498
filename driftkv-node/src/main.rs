//! driftkv node daemon.
//!
//! Runs one replicated key-value node: a TCP listener for peer traffic and
//! an interactive command loop on stdin for local operations.
//!
//! Usage:
//!   driftkv-node --config config.json --state state.json
//!
//! Commands: set, get, list, clock, peers, rename, sync, conflicts,
//! resolve, save, help, quit.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use driftkv_store::Resolution;
use driftkv_sync::{
    serve, JsonFileStore, NodeConfig, NodeEvent, Replicator, StateStore, TcpTransport,
};
use driftkv_types::NodeId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "driftkv-node")]
#[command(about = "Replicated causal key-value node")]
struct Args {
    /// Path to the node configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Path to the persisted state file
    #[arg(short, long, default_value = "state.json")]
    state: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let config = NodeConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    let state_store = JsonFileStore::new(&args.state);
    let restored = state_store
        .load()
        .with_context(|| format!("failed to read state from {}", args.state.display()))?;
    if restored.is_some() {
        info!(path = %args.state.display(), "restored saved state");
    }

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!(id = %config.id, listen = %config.listen, peers = config.peers.len(), "node starting");

    let (node, mut events) = Replicator::new(config, restored, Arc::new(TcpTransport::new()));
    let node = Arc::new(node);

    let listen_node = node.clone();
    tokio::spawn(async move {
        if let Err(e) = serve(listener, listen_node).await {
            error!("listener stopped: {e}");
        }
    });

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            report_event(&event);
        }
    });

    command_loop(node, state_store).await
}

fn report_event(event: &NodeEvent) {
    match event {
        NodeEvent::EntryApplied { key, sender } => {
            info!("received {key} from {sender}");
        }
        NodeEvent::ConflictDetected(conflict) => {
            warn!(
                "conflict on '{}': existing '{}' vs incoming '{}' — resolve {} keep|accept",
                conflict.key, conflict.existing.value, conflict.incoming.value, conflict.id
            );
        }
        NodeEvent::ConflictResolved { key, decision } => {
            info!("conflict on '{key}' resolved ({decision:?})");
        }
        NodeEvent::ResolutionApplied { key, sender } => {
            info!("'{key}' settled by {sender}");
        }
        NodeEvent::PeerRenamed { old, new } => {
            info!("peer renamed: {old} -> {new}");
        }
        NodeEvent::DeliveryFailed {
            peer,
            addr,
            attempts,
        } => {
            warn!("could not reach {peer} at {addr} after {attempts} attempts");
        }
    }
}

async fn command_loop<S: StateStore>(
    node: Arc<Replicator<TcpTransport>>,
    state_store: S,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b">>> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("set") => {
                let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                    println!("usage: set <key> <value>");
                    continue;
                };
                match node.set(key, value).await {
                    Ok(()) => println!("{key} = {value}"),
                    Err(e) => println!("refused: {e}"),
                }
            }
            Some("get") => match parts.next() {
                Some(key) => match node.get(key).await {
                    Some(value) => println!("{key} = {value}"),
                    None => println!("(not set)"),
                },
                None => println!("usage: get <key>"),
            },
            Some("list") => {
                let entries = node.entries().await;
                if entries.is_empty() {
                    println!("(empty)");
                }
                for (key, entry) in entries {
                    println!("{key:<12} = {:<12} clock {:?}", entry.value, entry.clock);
                }
            }
            Some("clock") => {
                println!("{:?}", node.clock().await);
            }
            Some("peers") => {
                for (id, addr) in node.peers().await {
                    println!("{id:<12} {addr}");
                }
            }
            Some("rename") => match parts.next() {
                Some(new_name) => match NodeId::parse(new_name) {
                    Ok(new_id) => {
                        node.rename(new_id).await;
                        println!("now known as {}", node.local_id().await);
                    }
                    Err(e) => println!("refused: {e}"),
                },
                None => println!("usage: rename <new-name>"),
            },
            Some("sync") => {
                node.request_sync().await;
            }
            Some("conflicts") => {
                let pending = node.pending_conflicts().await;
                if pending.is_empty() {
                    println!("(none)");
                }
                for c in pending {
                    println!(
                        "{}  '{}': existing '{}' vs incoming '{}'",
                        c.id, c.key, c.existing.value, c.incoming.value
                    );
                }
            }
            Some("resolve") => {
                let (Some(id), Some(choice)) = (parts.next(), parts.next()) else {
                    println!("usage: resolve <conflict-id> keep|accept");
                    continue;
                };
                let Ok(id) = id.parse() else {
                    println!("invalid conflict id");
                    continue;
                };
                let decision = match choice {
                    "keep" => Resolution::KeepExisting,
                    "accept" => Resolution::AcceptIncoming,
                    _ => {
                        println!("usage: resolve <conflict-id> keep|accept");
                        continue;
                    }
                };
                match node.resolve(id, decision).await {
                    Ok(()) => println!("resolved"),
                    Err(e) => println!("refused: {e}"),
                }
            }
            Some("save") => {
                let state = node.persisted_state().await;
                match state_store.save(&state) {
                    Ok(()) => println!("state saved"),
                    Err(e) => println!("save failed: {e}"),
                }
            }
            Some("help") => {
                println!("set <k> <v> | get <k> | list | clock | peers");
                println!("rename <new> | sync | conflicts | resolve <id> keep|accept");
                println!("save | quit");
            }
            Some("quit") | Some("exit") => break,
            Some(other) => println!("unknown command '{other}' (try: help)"),
            None => {}
        }
    }

    Ok(())
}
