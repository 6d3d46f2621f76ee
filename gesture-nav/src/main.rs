//! gesture-nav - replay a landmark stream through the gesture session.
//!
//! Reads one s-expression message per line, writes one response per line
//! followed by any navigation events the message produced.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, warn};

use gesture_nav::hand::GestureConfig;
use gesture_nav::ipc;
use gesture_nav::state::NavState;

#[derive(Parser, Debug)]
#[command(name = "gesture-nav", about = "Hand-gesture page navigation")]
struct Cli {
    /// Message stream to read (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Config overrides as an s-expression plist
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of pages in the document
    #[arg(long, default_value_t = 0)]
    pages: u32,

    /// Wait for a gesture-start message instead of starting immediately
    #[arg(long)]
    no_autostart: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("gesture-nav {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Logs go to stderr; stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gesture_nav=info".into()),
        )
        .init();

    info!("gesture-nav v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GestureConfig::default(),
    };

    let mut state = NavState::new(config, cli.pages);
    if !cli.no_autostart {
        state.gesture.start();
    }

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => {
            let file = fs::File::open(path)
                .map_err(|e| anyhow::anyhow!("failed to open {:?}: {}", path, e))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(io::stdin().lock()),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut lines = 0u64;

    for line in reader.lines() {
        let line = line.map_err(|e| anyhow::anyhow!("read failed: {}", e))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        lines += 1;

        if let Some(response) = ipc::handle_message(&mut state, line) {
            writeln!(out, "{}", response)?;
        }
        for event in state.drain_events() {
            writeln!(out, "{}", event)?;
        }
    }
    out.flush()?;

    state.gesture.stop();
    info!(lines, page = state.pager.current(), "input exhausted");
    Ok(())
}

/// Read a config plist such as `(:swipe-cooldown-ms 700)`.
fn load_config(path: &Path) -> anyhow::Result<GestureConfig> {
    let raw = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config {:?}: {}", path, e))?;
    let value = lexpr::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("malformed config {:?}: {}", path, e))?;

    let mut config = GestureConfig::default();
    ipc::apply_config(&mut config, &value).map_err(|reason| {
        warn!("rejecting config {:?}: {}", path, reason);
        anyhow::anyhow!("invalid config {:?}: {}", path, reason)
    })?;
    info!("loaded config from {:?}", path);
    Ok(config)
}
