//! Record types shared by the jobpilot engine and its external producers.
//!
//! Everything in this crate round-trips through the JSON files in the data
//! directory, so field names follow the shapes those files already use:
//!
//! * [`Task`] - one entry of `tasks.json`
//! * [`SessionCredential`] - the cookie list in `cookies.json`
//! * [`UserConfig`] - the read-only `user_config.json` record
//! * [`IntentHints`] / [`ApplyIntent`] - resolved search parameters
//! * [`ProgressEvent`] - ephemeral progress reports from the apply workflow

pub mod cookie;
pub mod intent;
pub mod progress;
pub mod task;
pub mod user_config;

pub use cookie::{Cookie, SameSite, SessionCredential};
pub use intent::{ApplyIntent, IntentDefaults, IntentHints};
pub use progress::ProgressEvent;
pub use task::{WAITING_LOG, ApplyParams, NewTask, Task, TaskId, TaskKind, TaskPatch, TaskStatus, TransitionError};
pub use user_config::UserConfig;
