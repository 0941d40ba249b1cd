//! # ordaa
//!
//! Command line entry point.
//!
//! - `ordaa demo` plays a scripted group order through the chat bot.
//! - `ordaa serve` runs the REST API until Ctrl-C.
//! - `ordaa chat --user NAME` reads chat commands from stdin.
//!
//! All three start from an in-memory store seeded with a sample menu.

use anyhow::Context;
use clap::{Parser, Subcommand};
use ordaa::config::Config;
use ordaa::lifecycle::{setup_tracing, OrderSystem};
use ordaa::model::{NewMenu, NewMenuItem, Price};
use ordaa::registry::OrderContext;
use ordaa::store::MemoryStore;
use ordaa::transport::{self, ChannelPublisher, ChatBot};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted order from start to delivery
    Demo,
    /// Serve the REST API
    Serve,
    /// Send chat commands from stdin as the given user
    Chat {
        #[arg(short, long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    config.validate()?;
    setup_tracing(&config.logging.level);

    // Placed orders are logged as they are published.
    let (events_tx, mut events_rx) = mpsc::channel::<String>(32);
    let events = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            info!(%event, "Order event");
        }
    });

    let context = OrderContext::with_publisher(Arc::new(ChannelPublisher::new(events_tx)));
    let system = OrderSystem::new(&config.coordinator, Arc::new(MemoryStore::new()), context)?;
    system
        .order_client
        .create_menu(sample_menu())
        .await
        .context("seeding sample menu")?;

    let outcome = match cli.command {
        Command::Demo => demo(&system).instrument(info_span!("demo")).await,
        Command::Serve => serve(&config, &system).await,
        Command::Chat { user } => chat(&system, &user).await,
    };

    system.shutdown().await;
    // The publisher lives in the coordinator context, so the channel closes here.
    events.await.context("event logger")?;
    outcome
}

fn sample_menu() -> NewMenu {
    let item = |short_name: &str, name: &str, cents| NewMenuItem {
        short_name: short_name.into(),
        name: name.into(),
        price: Price(cents),
    };
    NewMenu {
        name: "pizza".into(),
        url: Some("https://example.com/pizza".into()),
        items: vec![
            item("marg", "Margherita", 850),
            item("fun", "Funghi", 950),
            item("diav", "Diavola", 1050),
        ],
    }
}

async fn demo(system: &OrderSystem) -> anyhow::Result<()> {
    let bot = ChatBot::new(system.order_client.clone());
    let script = [
        ("alice", "register"),
        ("bob", "register"),
        ("alice", "start pizza"),
        ("alice", "add pizza marg"),
        ("bob", "add pizza diav"),
        ("bob", "paid pizza"),
        ("alice", "finalize pizza"),
        ("bob", "add pizza fun"),
        ("bob", "toggle_paid pizza alice"),
        ("alice", "ordered pizza"),
        ("bob", "status pizza"),
        ("alice", "delivered pizza"),
        ("alice", "re-open pizza"),
    ];
    for (sender, text) in script {
        let reply = bot.handle(sender, text).await;
        info!(sender, text, "{}", reply);
    }
    Ok(())
}

async fn serve(config: &Config, system: &OrderSystem) -> anyhow::Result<()> {
    let stop = CancellationToken::new();
    let signal = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
        }
        signal.cancel();
    });

    transport::serve(&config.api, system.order_client.clone(), stop)
        .await
        .context("REST API")
}

async fn chat(system: &OrderSystem, user: &str) -> anyhow::Result<()> {
    let bot = ChatBot::new(system.order_client.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        println!("{}", bot.handle(user, &line).await);
    }
    Ok(())
}
