//! On-disk stores in the data directory.

pub mod fs;
pub mod queue;
pub mod session;
pub mod user_config;

pub use queue::{QueueEntry, TaskQueue};
pub use session::SessionStore;
pub use user_config::UserConfigStore;
