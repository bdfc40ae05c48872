//! [`SchemaWatcher`]: spawns the polling loop and hands back a [`WatchHandle`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tokio::sync::Notify;
use tokio::task::{self, JoinHandle};
use tracing::{debug, warn};

use crate::error::{PluginError, Result};

use super::state::{PollOutcome, WatchState};

/// Name of the thread that polls when no tokio runtime is available.
pub(crate) const WATCH_THREAD_NAME: &str = "relay-hot-watch";

/// Watches one file's modification time by polling.
#[derive(Debug)]
pub struct SchemaWatcher {
    state: WatchState,
}

impl SchemaWatcher {
    /// Create a watcher polling `path` every `interval_ms` milliseconds.
    ///
    /// Returns `None` when `interval_ms` is zero: watching is disabled. The path
    /// does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>, interval_ms: u64) -> Option<Self> {
        (interval_ms > 0).then(|| Self {
            state: WatchState::new(path.into(), Duration::from_millis(interval_ms)),
        })
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// Start polling.
    ///
    /// Inside a tokio runtime the loop is a task on that runtime. Outside one,
    /// it runs on a detached thread with its own single-threaded runtime; the
    /// thread never keeps the process alive.
    ///
    /// The file is stat'ed immediately, then once per interval. `on_change`
    /// runs before the next sleep each time the modification time differs
    /// from the previous observation. On a multi-threaded runtime it runs
    /// under [`task::block_in_place`], so blocking work inside it does not
    /// stall other tasks.
    pub fn start<F>(self, on_change: F) -> Result<WatchHandle>
    where
        F: FnMut() + Send + 'static,
    {
        let polls = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(Notify::new());

        debug!(
            path = %self.state.path().display(),
            interval_ms = self.state.interval().as_millis() as u64,
            "starting schema watcher"
        );

        let backend = match Handle::try_current() {
            Ok(runtime) => {
                let offload = runtime.runtime_flavor() == RuntimeFlavor::MultiThread;
                let run = poll_loop(
                    self.state,
                    on_change,
                    Arc::clone(&polls),
                    Arc::clone(&stop),
                    offload,
                );
                Backend::Task(runtime.spawn(run))
            }
            Err(_) => {
                debug!("no tokio runtime, polling on a dedicated thread");
                let runtime = Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .map_err(PluginError::WatchThread)?;
                let run = poll_loop(
                    self.state,
                    on_change,
                    Arc::clone(&polls),
                    Arc::clone(&stop),
                    false,
                );
                let thread = thread::Builder::new()
                    .name(WATCH_THREAD_NAME.to_string())
                    .spawn(move || runtime.block_on(run))
                    .map_err(PluginError::WatchThread)?;
                Backend::Thread(thread)
            }
        };

        Ok(WatchHandle {
            backend,
            stop,
            polls,
        })
    }
}

/// Poll, react, sleep one interval, repeat until stopped.
async fn poll_loop<F>(
    mut state: WatchState,
    mut on_change: F,
    polls: Arc<AtomicU64>,
    stop: Arc<Notify>,
    offload: bool,
) where
    F: FnMut(),
{
    // Stat errors repeat every tick while a file is missing; warn once per streak.
    let mut failing = false;

    loop {
        match state.poll() {
            Ok(outcome) => {
                if failing {
                    debug!(path = %state.path().display(), "schema file reachable again");
                    failing = false;
                }
                match outcome {
                    PollOutcome::Baseline => {
                        debug!(path = %state.path().display(), "recorded schema baseline");
                    }
                    PollOutcome::Unchanged => {}
                    PollOutcome::Changed => {
                        debug!(path = %state.path().display(), "schema file changed");
                        if offload {
                            task::block_in_place(&mut on_change);
                        } else {
                            on_change();
                        }
                    }
                }
            }
            Err(e) if !failing => {
                warn!(path = %state.path().display(), error = %e, "cannot stat schema file");
                failing = true;
            }
            Err(e) => {
                debug!(path = %state.path().display(), error = %e, "schema file still unavailable");
            }
        }

        polls.fetch_add(1, Ordering::SeqCst);

        tokio::select! {
            _ = tokio::time::sleep(state.interval()) => {}
            _ = stop.notified() => break,
        }
    }

    debug!(path = %state.path().display(), "schema watcher stopped");
}

#[derive(Debug)]
enum Backend {
    Task(JoinHandle<()>),
    Thread(thread::JoinHandle<()>),
}

/// Handle to a running poll loop.
///
/// Dropping the handle stops polling.
#[derive(Debug)]
pub struct WatchHandle {
    backend: Backend,
    stop: Arc<Notify>,
    polls: Arc<AtomicU64>,
}

impl WatchHandle {
    /// Stop polling. Takes effect at the loop's next sleep; a change callback
    /// already running completes first.
    pub fn stop(&self) {
        // notify_one stores a permit if the loop is not waiting yet.
        self.stop.notify_one();
        if let Backend::Task(task) = &self.backend {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        match &self.backend {
            Backend::Task(task) => !task.is_finished(),
            Backend::Thread(thread) => !thread.is_finished(),
        }
    }

    /// Number of completed poll steps, including any `on_change` call.
    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
