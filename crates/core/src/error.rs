use std::path::PathBuf;

use jobpilot_protocol::{TaskId, TransitionError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// How the worker reacts to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
	/// Recovered locally (fallback selector, per-listing skip).
	Transient,
	/// Login required or unattainable, browser unusable.
	Session,
	/// Aborts the current task only.
	Workflow,
	/// Queue/config storage failures; the loop backs off and retries.
	Infrastructure,
}

#[derive(Debug, Error)]
pub enum EngineError {
	#[error(transparent)]
	Runtime(#[from] jobpilot_runtime::Error),

	#[error("{}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("{}: invalid JSON: {source}", path.display())]
	Json {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("timed out after {ms}ms acquiring queue lock {}", path.display())]
	QueueLock { path: PathBuf, ms: u64 },

	#[error("task not found: {0}")]
	TaskNotFound(TaskId),

	#[error("task {id}: {source}")]
	InvalidTransition {
		id: TaskId,
		#[source]
		source: TransitionError,
	},

	#[error("login timed out after {secs}s waiting for verification")]
	LoginTimeout { secs: u64 },

	#[error("login page unavailable")]
	LoginUnavailable,

	#[error("no listings found for {keyword} in {city}")]
	NoListings { keyword: String, city: String },

	#[error("intent resolution failed: {0}")]
	Intent(String),

	#[error("invalid settings in {}: {reason}", path.display())]
	Settings { path: PathBuf, reason: String },

	#[error("another worker (pid {pid}) holds {}", path.display())]
	WorkerLeaseHeld { path: PathBuf, pid: u32 },

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl EngineError {
	pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		EngineError::Io { path: path.into(), source }
	}

	pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
		EngineError::Json { path: path.into(), source }
	}

	pub fn class(&self) -> ErrorClass {
		match self {
			EngineError::Runtime(err) if err.is_browser_level() => ErrorClass::Session,
			EngineError::Runtime(_) => ErrorClass::Transient,
			EngineError::LoginTimeout { .. } | EngineError::LoginUnavailable => ErrorClass::Session,
			EngineError::NoListings { .. } | EngineError::Intent(_) | EngineError::Anyhow(_) => ErrorClass::Workflow,
			EngineError::Io { .. }
			| EngineError::Json { .. }
			| EngineError::QueueLock { .. }
			| EngineError::TaskNotFound(_)
			| EngineError::InvalidTransition { .. }
			| EngineError::Settings { .. }
			| EngineError::WorkerLeaseHeld { .. } => ErrorClass::Infrastructure,
		}
	}

	/// True when the browser should be torn down before the next task.
	pub fn needs_browser_restart(&self) -> bool {
		matches!(self, EngineError::Runtime(err) if err.is_browser_level())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classifies_by_taxonomy() {
		let no_listings = EngineError::NoListings {
			keyword: "产品经理".into(),
			city: "北京".into(),
		};
		assert_eq!(no_listings.class(), ErrorClass::Workflow);
		assert_eq!(no_listings.to_string(), "no listings found for 产品经理 in 北京");

		assert_eq!(EngineError::LoginTimeout { secs: 180 }.class(), ErrorClass::Session);
		assert_eq!(
			EngineError::QueueLock {
				path: "tasks.json.lock".into(),
				ms: 5000
			}
			.class(),
			ErrorClass::Infrastructure
		);
	}

	#[test]
	fn disconnected_browser_requests_restart() {
		let err = EngineError::from(jobpilot_runtime::Error::Disconnected("ws closed".into()));
		assert!(err.needs_browser_restart());
		assert_eq!(err.class(), ErrorClass::Session);

		let stale = EngineError::from(jobpilot_runtime::Error::Detached("node".into()));
		assert!(!stale.needs_browser_restart());
		assert_eq!(stale.class(), ErrorClass::Transient);
	}
}
