//! Polling schema-file watcher.
//!
//! Stats the schema file once per interval and reports when its modification
//! time changes. The first successful stat only records a baseline. Stat
//! failures (missing file, permissions) are logged and polling continues.
//! Polling runs as a tokio task, so it never keeps a runtime alive on its own.

mod core;
mod state;


pub use self::core::{SchemaWatcher, WatchHandle};
pub use self::state::{PollOutcome, WatchState};
