//! RoomStock controller — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  PinIndicators   PinButtons   LogEventSink   HttpMirror      │
//! │  (cdev / sim)    (cdev / sim) (EventSink)    (MirrorPort)    │
//! │  LineTagReader   IioDht11     axum router                    │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │       InventoryService  ·  InventoryStore              │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  threads: button · display · climate · mirror                │
//! │  tokio: requests                                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use roomstock::adapters::dht11::IioDht11;
use roomstock::adapters::hardware;
use roomstock::adapters::log_sink::LogEventSink;
use roomstock::adapters::mirror::{HttpMirror, mirror_mailbox, run_mirror_worker};
use roomstock::adapters::tag_reader::LineTagReader;
use roomstock::app::climate::ClimateCell;
use roomstock::app::ports::SharedIndicators;
use roomstock::app::service::InventoryService;
use roomstock::app::session::{OperatorSession, TagAllowList};
use roomstock::app::store::InventoryStore;
use roomstock::config::{Backend, SystemConfig};
use roomstock::drivers::button::ButtonMonitor;
use roomstock::drivers::climate::ClimateMonitor;
use roomstock::drivers::display::DisplayDriver;
use roomstock::drivers::task::{LOOP_STACK_KB, ShutdownSignal, join_bounded, spawn_named};
use roomstock::web::{self, WebState};

/// Time allowed for open requests to finish after a shutdown signal.
const HTTP_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "roomstock", version, about = "Storage-room inventory controller")]
struct Cli {
    /// JSON configuration file (defaults apply when omitted).
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the listen address.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Use simulated pins instead of the GPIO character device.
    #[arg(long)]
    sim: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // ── Configuration ─────────────────────────────────────────
    let mut config = SystemConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if cli.sim {
        config.backend = Backend::Sim;
    }
    config.validate().context("validating configuration")?;
    info!(
        "RoomStock v{} starting ({} rooms, {} digit(s), backend {:?})",
        env!("CARGO_PKG_VERSION"),
        config.room_count,
        config.digits,
        config.backend
    );

    // ── Hardware ──────────────────────────────────────────────
    // A line that cannot be claimed is fatal.
    let ports = hardware::build(&config).context("claiming GPIO lines")?;
    let indicators: SharedIndicators = Arc::new(Mutex::new(ports.indicators));

    // ── Core ──────────────────────────────────────────────────
    let store = Arc::new(InventoryStore::from_config(&config)?);
    let shutdown = ShutdownSignal::new();
    let mut handles = Vec::new();

    // The mirror worker is joined on its own: an in-flight push may run
    // for two request timeouts.
    let mut mirror_join = None;
    let mirror = match &config.mirror {
        Some(mirror_cfg) => {
            let (tx, rx) = mirror_mailbox();
            let port = HttpMirror::new(mirror_cfg);
            let retries = mirror_cfg.max_retries;
            let stop = shutdown.clone();
            let handle = spawn_named("mirror", LOOP_STACK_KB, move || {
                run_mirror_worker(port, rx, retries, stop);
            })?;
            let bound = Duration::from_millis(config.shutdown_timeout_ms + 2 * mirror_cfg.timeout_ms);
            mirror_join = Some((handle, bound));
            info!("mirror: enabled ({})", mirror_cfg.base_url);
            Some(tx)
        }
        None => None,
    };

    let service = Arc::new(InventoryService::new(
        store.clone(),
        indicators.clone(),
        LogEventSink::new(),
        mirror,
    ));
    service.start();

    // ── Hardware loops ────────────────────────────────────────
    let monitor = ButtonMonitor::new(
        ports.buttons,
        service.clone(),
        Duration::from_millis(config.button_poll_ms),
        Duration::from_millis(config.debounce_ms),
    );
    let stop = shutdown.clone();
    handles.push(spawn_named("buttons", LOOP_STACK_KB, move || monitor.run(stop))?);

    let display = DisplayDriver::new(store, indicators, &config);
    let stop = shutdown.clone();
    handles.push(spawn_named("display", LOOP_STACK_KB, move || display.run(stop))?);

    let mut climate = None;
    if let Some(climate_cfg) = &config.climate {
        let cell = Arc::new(ClimateCell::new());
        let monitor = ClimateMonitor::new(
            IioDht11::new(&climate_cfg.device),
            cell.clone(),
            Duration::from_millis(climate_cfg.period_ms),
            Duration::from_millis(climate_cfg.retry_ms),
        );
        let stop = shutdown.clone();
        handles.push(spawn_named("climate", LOOP_STACK_KB, move || monitor.run(stop))?);
        info!("climate: DHT11 at {}", climate_cfg.device.display());
        climate = Some(cell);
    }

    // ── Request surface ───────────────────────────────────────
    let session = Arc::new(OperatorSession::new(TagAllowList::new(
        config.allowed_tags.iter().cloned(),
    )));
    let mut state = WebState::new(service.clone(), session);
    if let Some(path) = &config.tag_reader {
        info!("tag reader: {}", path.display());
        state = state.with_reader(LineTagReader::new(path));
    }
    if let Some(cell) = climate {
        state = state.with_climate(cell);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building async runtime")?;
    let bind = config.bind;
    let served = runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .with_context(|| format!("binding {}", bind))?;
        web::serve(listener, web::router(state), HTTP_GRACE)
            .await
            .context("serving requests")
    });

    // ── Shutdown ──────────────────────────────────────────────
    info!("Shutting down");
    shutdown.raise();
    if !join_bounded(handles, Duration::from_millis(config.shutdown_timeout_ms)) {
        warn!("some loops did not stop in time; forcing outputs off");
    }
    service.shutdown();
    if let Some((handle, bound)) = mirror_join {
        if !join_bounded(vec![handle], bound) {
            warn!("mirror: last push still in flight, abandoning it");
        }
    }
    drop(runtime);

    served
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
