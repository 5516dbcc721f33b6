//! Remote mirror adapter.
//!
//! Pushes room state to a Firebase-style realtime JSON store after each
//! mutation.  Two documents are overwritten on every push:
//!
//! ```text
//! PUT {base_url}/inventory.json   {"Room 1": 10, "Room 2": 4, ...}
//! PUT {base_url}/low_stock.json   {"Room 1": false, "Room 2": true, ...}
//! ```
//!
//! Pushes never run on the mutation path.  The service drops the latest
//! snapshot into a single-slot mailbox ([`MirrorHandle::submit`]) and a
//! background worker ([`run_mirror_worker`]) ships it.  A newer snapshot
//! replaces an unsent one, which is safe because every push is a full
//! overwrite.
//!
//! ## Retry policy
//!
//! A failed push is retried with exponential backoff (250 ms → 500 ms →
//! … capped at 5 s), at most `max_retries` times after the first attempt.
//! If a newer snapshot arrives while backing off, the worker switches to
//! it and the retry count restarts.  The backoff is waited out in short
//! slices so a shutdown is noticed within one idle poll.  Failures are
//! logged and never surfaced to callers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use serde_json::{Map, Value};

use crate::app::ports::{MirrorError, MirrorPort};
use crate::app::store::{Snapshot, room_name};
use crate::config::MirrorConfig;
use crate::drivers::task::ShutdownSignal;

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(5);
/// How often an idle worker re-checks the shutdown signal.
const IDLE_POLL: Duration = Duration::from_millis(100);

// ───────────────────────────────────────────────────────────────
// Payload
// ───────────────────────────────────────────────────────────────

/// Build the `(inventory, low_stock)` documents for a snapshot.
pub fn mirror_payload(snapshot: &Snapshot) -> (Value, Value) {
    let mut counts = Map::new();
    let mut low = Map::new();
    for room in &snapshot.rooms {
        counts.insert(room_name(room.id), Value::from(room.count));
        low.insert(room_name(room.id), Value::from(room.warning_active));
    }
    (Value::Object(counts), Value::Object(low))
}

// ───────────────────────────────────────────────────────────────
// HTTP mirror
// ───────────────────────────────────────────────────────────────

/// [`MirrorPort`] over HTTP `PUT` with JSON bodies.
pub struct HttpMirror {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpMirror {
    pub fn new(config: &MirrorConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn put(&self, document: &str, body: &Value) -> Result<(), MirrorError> {
        let url = format!("{}/{}.json", self.base_url, document);
        let payload =
            serde_json::to_string(body).map_err(|e| MirrorError::Encode(e.to_string()))?;
        match self
            .agent
            .put(&url)
            .set("Content-Type", "application/json")
            .send_string(&payload)
        {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, _)) => Err(MirrorError::Status(code)),
            Err(e) => Err(MirrorError::Transport(e.to_string())),
        }
    }
}

impl MirrorPort for HttpMirror {
    fn push(&mut self, snapshot: &Snapshot) -> Result<(), MirrorError> {
        let (counts, low) = mirror_payload(snapshot);
        self.put("inventory", &counts)?;
        self.put("low_stock", &low)
    }
}

// ───────────────────────────────────────────────────────────────
// Single-slot mailbox
// ───────────────────────────────────────────────────────────────

struct Slot {
    pending: Mutex<Option<Snapshot>>,
    ready: Condvar,
}

/// Producer side, held by the service.  Cloning shares the mailbox.
#[derive(Clone)]
pub struct MirrorHandle {
    slot: Arc<Slot>,
}

/// Consumer side, owned by the worker.
pub struct MirrorReceiver {
    slot: Arc<Slot>,
}

/// Create a connected handle / receiver pair.
pub fn mirror_mailbox() -> (MirrorHandle, MirrorReceiver) {
    let slot = Arc::new(Slot {
        pending: Mutex::new(None),
        ready: Condvar::new(),
    });
    (
        MirrorHandle { slot: slot.clone() },
        MirrorReceiver { slot },
    )
}

impl MirrorHandle {
    /// Queue `snapshot` for pushing, replacing any unsent one.  Never blocks
    /// beyond the mailbox lock.
    pub fn submit(&self, snapshot: Snapshot) {
        *self.slot.pending.lock() = Some(snapshot);
        self.slot.ready.notify_one();
    }
}

impl MirrorReceiver {
    /// Take the pending snapshot, waiting at most `timeout` for one.
    pub fn take_within(&self, timeout: Duration) -> Option<Snapshot> {
        let mut pending = self.slot.pending.lock();
        if pending.is_none() {
            let _ = self.slot.ready.wait_for(&mut pending, timeout);
        }
        pending.take()
    }
}

// ───────────────────────────────────────────────────────────────
// Worker
// ───────────────────────────────────────────────────────────────

/// Ship snapshots from `rx` to `port` until `shutdown` is raised.
pub fn run_mirror_worker(
    mut port: impl MirrorPort,
    rx: MirrorReceiver,
    max_retries: u32,
    shutdown: ShutdownSignal,
) {
    info!("mirror: worker started (max_retries={})", max_retries);

    while !shutdown.is_raised() {
        let Some(mut snapshot) = rx.take_within(IDLE_POLL) else {
            continue;
        };

        let mut retries = 0u32;
        let mut backoff = INITIAL_BACKOFF;
        loop {
            match port.push(&snapshot) {
                Ok(()) => {
                    debug!("mirror: pushed {} rooms", snapshot.rooms.len());
                    break;
                }
                Err(e) if retries >= max_retries => {
                    warn!("mirror: push failed ({}), dropping snapshot after {} attempts", e, retries + 1);
                    break;
                }
                Err(e) => {
                    retries += 1;
                    warn!("mirror: push failed ({}), retry {}/{} in {:?}", e, retries, max_retries, backoff);
                }
            }

            match wait_out_backoff(&rx, backoff, &shutdown) {
                Backoff::Newer(newer) => {
                    snapshot = newer;
                    retries = 0;
                    backoff = INITIAL_BACKOFF;
                }
                Backoff::Elapsed => backoff = (backoff * 2).min(MAX_BACKOFF),
                Backoff::Shutdown => break,
            }
        }
    }
    info!("mirror: worker stopped");
}

enum Backoff {
    Newer(Snapshot),
    Elapsed,
    Shutdown,
}

fn wait_out_backoff(rx: &MirrorReceiver, backoff: Duration, shutdown: &ShutdownSignal) -> Backoff {
    let deadline = Instant::now() + backoff;
    loop {
        if shutdown.is_raised() {
            return Backoff::Shutdown;
        }
        let left = deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Backoff::Elapsed;
        }
        if let Some(newer) = rx.take_within(left.min(IDLE_POLL)) {
            return Backoff::Newer(newer);
        }
    }
}
