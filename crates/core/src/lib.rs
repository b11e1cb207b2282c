//! jobpilot: job-application automation engine.
//!
//! Tasks arrive in a shared `tasks.json` queue. The [`Worker`] picks the
//! oldest pending one, turns its free text into a search intent, and runs the
//! apply workflow in a long-lived browser session whose cookies survive
//! restarts.
//!
//! # Example
//!
//! ```ignore
//! use jobpilot::{BrowserApplyRunner, SessionManager, SessionStore, Settings, StatePaths, TaskQueue, UserConfigStore, Worker};
//! use jobpilot_runtime::ChromiumLauncher;
//!
//! let paths = StatePaths::resolve(None);
//! let settings = Settings::load(&paths.settings)?;
//! let session = SessionManager::new(ChromiumLauncher, &settings, SessionStore::new(&paths), UserConfigStore::new(&paths));
//! let mut worker = Worker::new(
//!     TaskQueue::new(&paths, settings.queue_lock.clone()),
//!     UserConfigStore::new(&paths),
//!     jobpilot::intent::resolver_from_settings(&settings.intent)?,
//!     BrowserApplyRunner::new(session),
//!     settings,
//! );
//! worker.run(async { tokio::signal::ctrl_c().await.ok(); }).await;
//! ```

pub mod error;
pub mod intent;
pub mod paths;
pub mod selectors;
pub mod session;
pub mod settings;
pub mod site;
pub mod store;
pub mod worker;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use error::{EngineError, ErrorClass, Result};
pub use intent::{IntentResolver, resolver_from_settings};
pub use paths::StatePaths;
pub use session::{SessionManager, SessionState};
pub use settings::{Settings, StaleRunningPolicy};
pub use store::{SessionStore, TaskQueue, UserConfigStore};
pub use worker::{ApplyRunner, BrowserApplyRunner, Worker, WorkerLease};
pub use workflow::{ApplyReport, ApplyWorkflow, ListingOutcome};
