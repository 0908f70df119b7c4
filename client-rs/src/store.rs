//! Polling authorization store

use crate::config::StoreConfig;
use crate::error::Result;
use crate::snapshot::AuthorizationSnapshot;
use crate::source::{AuthorizationSource, HttpSource};
use crate::state::AuthorizationState;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Internal store state
struct StoreInner {
    config: StoreConfig,
    source: Arc<dyn AuthorizationSource>,
    state: watch::Sender<AuthorizationState>,
    state_rx: watch::Receiver<AuthorizationState>,

    // Fetches started but not yet settled; only touched inside `send_modify`
    in_flight: AtomicUsize,

    // Sequence number for log correlation
    fetch_seq: AtomicU64,

    // Cleared by `close`; late results are discarded once false
    alive: AtomicBool,

    // Poll loop task, present while the schedule is running
    poller: Mutex<Option<JoinHandle<()>>>,
}

/// Holds the session's authorization state and keeps it in sync with the
/// backend.
///
/// Readers get a synchronous snapshot with [`state`](Self::state) or a
/// change stream with [`subscribe`](Self::subscribe). Only the store
/// itself writes: every fetch replaces the cached permissions and role,
/// and every failed fetch clears them. This struct is cheaply cloneable
/// as it uses an internal Arc.
#[derive(Clone)]
pub struct AuthorizationStore {
    inner: Arc<StoreInner>,
}

impl AuthorizationStore {
    /// Create a store that fetches over HTTP as described by `config`
    pub fn new(config: StoreConfig) -> Result<Self> {
        let source = HttpSource::new(&config)?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Create a store backed by a custom source
    pub fn with_source(config: StoreConfig, source: Arc<dyn AuthorizationSource>) -> Self {
        let (state_tx, state_rx) = watch::channel(AuthorizationState::default());

        let inner = Arc::new(StoreInner {
            config,
            source,
            state: state_tx,
            state_rx,
            in_flight: AtomicUsize::new(0),
            fetch_seq: AtomicU64::new(0),
            alive: AtomicBool::new(true),
            poller: Mutex::new(None),
        });

        Self { inner }
    }

    /// Current cached state. Never blocks and never fetches.
    pub fn state(&self) -> AuthorizationState {
        self.inner.state_rx.borrow().clone()
    }

    /// Get a receiver for state changes
    pub fn subscribe(&self) -> watch::Receiver<AuthorizationState> {
        self.inner.state_rx.clone()
    }

    /// Configuration the store was built with
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Fetch now and replace the cached state with the result.
    ///
    /// Never fails: an unsuccessful fetch leaves the state empty. Calls may
    /// overlap; whichever fetch completes last determines the final state.
    pub async fn refresh(&self) {
        self.inner.refresh().await
    }

    /// Start polling: one refresh right away, then one per
    /// `refresh_interval` until [`stop`](Self::stop).
    ///
    /// Returns false if the schedule was already running, the store has
    /// been closed, or the interval is zero. Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        if !self.inner.alive.load(Ordering::SeqCst) {
            warn!("Cannot start a closed authorization store");
            return false;
        }

        let mut poller = self.inner.poller.lock();
        if poller.is_some() {
            debug!("Authorization polling already running");
            return false;
        }

        let period = self.inner.config.refresh_interval;
        if period.is_zero() {
            warn!("Refresh interval is zero, not starting authorization polling");
            return false;
        }

        let first = self.inner.clone();
        tokio::spawn(async move { first.refresh().await });

        *poller = Some(tokio::spawn(poll_loop(Arc::downgrade(&self.inner))));

        info!(interval = ?period, "Authorization polling started");
        true
    }

    /// Cancel the polling schedule. Safe to call any number of times.
    ///
    /// A fetch already in flight still completes and is applied.
    pub fn stop(&self) {
        if let Some(handle) = self.inner.poller.lock().take() {
            handle.abort();
            info!("Authorization polling stopped");
        }
    }

    /// Stop polling and tear the store down. Results of fetches still in
    /// flight are discarded, and the store cannot be started again.
    pub fn close(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        self.stop();
    }

    /// Whether the polling schedule is active
    pub fn is_running(&self) -> bool {
        self.inner.poller.lock().is_some()
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        !self.inner.alive.load(Ordering::SeqCst)
    }
}

impl StoreInner {
    async fn refresh(&self) {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst);
        let mut pending = PendingFetch::begin(self);

        debug!(seq, "Refreshing authorization state");
        let result = self.source.fetch().await;

        pending.settle(seq, result);
    }

    /// Mark one fetch as settled and return the new `loading` value
    fn finish_fetch(&self) -> bool {
        self.in_flight.fetch_sub(1, Ordering::SeqCst) > 1
    }
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.get_mut().take() {
            handle.abort();
        }
    }
}

/// Brackets one fetch with the `loading` flag.
///
/// If the refresh future is dropped before the fetch settles, the guard
/// still releases its share of `loading` and leaves the cached data as is.
struct PendingFetch<'a> {
    inner: &'a StoreInner,
    settled: bool,
}

impl<'a> PendingFetch<'a> {
    fn begin(inner: &'a StoreInner) -> Self {
        inner.state.send_modify(|state| {
            inner.in_flight.fetch_add(1, Ordering::SeqCst);
            state.loading = true;
        });
        Self {
            inner,
            settled: false,
        }
    }

    fn settle(&mut self, seq: u64, result: Result<AuthorizationSnapshot>) {
        self.settled = true;
        let inner = self.inner;

        if !inner.alive.load(Ordering::SeqCst) {
            debug!(seq, "Store closed, discarding fetch result");
            inner.state.send_modify(|state| state.loading = inner.finish_fetch());
            return;
        }

        match result {
            Ok(snapshot) => {
                debug!(
                    seq,
                    permissions = snapshot.permissions.len(),
                    role = ?snapshot.role,
                    "Authorization state updated"
                );
                inner.state.send_modify(|state| {
                    state.apply(snapshot);
                    state.loading = inner.finish_fetch();
                });
            }
            Err(e) => {
                warn!(seq, error = %e, "Authorization refresh failed, clearing permissions");
                inner.state.send_modify(|state| {
                    state.revoke();
                    state.loading = inner.finish_fetch();
                });
            }
        }
    }
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let inner = self.inner;
            inner.state.send_modify(|state| state.loading = inner.finish_fetch());
        }
    }
}

/// Scheduled refreshes after the initial one. Holds only a weak reference
/// so dropping every store handle ends the loop.
async fn poll_loop(inner: Weak<StoreInner>) {
    let period = match inner.upgrade() {
        Some(inner) => inner.config.refresh_interval,
        None => return,
    };

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(store) = inner.upgrade() else {
            break;
        };
        tokio::spawn(async move { store.refresh().await });
    }
}
