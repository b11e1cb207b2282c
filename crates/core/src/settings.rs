//! Engine settings (`settings.json`).
//!
//! Every field is optional; a missing file yields the defaults. A file that
//! exists but does not parse is rejected so a typo never silently reverts
//! the worker to default timings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use jobpilot_protocol::IntentDefaults;
use jobpilot_runtime::{DEFAULT_USER_AGENT, LaunchOptions};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// What to do with tasks found `running` when the worker starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaleRunningPolicy {
	#[default]
	Fail,
	Requeue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
	pub poll_interval_ms: u64,
	pub error_backoff_ms: u64,
	pub stale_running: StaleRunningPolicy,
	pub browser: BrowserSettings,
	pub login: LoginSettings,
	pub timeouts: TimeoutSettings,
	pub defaults: IntentDefaults,
	pub intent: IntentSettings,
	pub queue_lock: QueueLockSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			poll_interval_ms: 2000,
			error_backoff_ms: 5000,
			stale_running: StaleRunningPolicy::default(),
			browser: BrowserSettings::default(),
			login: LoginSettings::default(),
			timeouts: TimeoutSettings::default(),
			defaults: IntentDefaults::default(),
			intent: IntentSettings::default(),
			queue_lock: QueueLockSettings::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserSettings {
	pub headless: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub executable: Option<PathBuf>,
	pub window_width: u32,
	pub window_height: u32,
	pub user_agent: String,
}

impl Default for BrowserSettings {
	fn default() -> Self {
		Self {
			headless: false,
			executable: None,
			window_width: 1280,
			window_height: 900,
			user_agent: DEFAULT_USER_AGENT.to_string(),
		}
	}
}

impl BrowserSettings {
	pub fn launch_options(&self) -> LaunchOptions {
		LaunchOptions {
			headless: self.headless,
			executable: self.executable.clone(),
			window_width: self.window_width,
			window_height: self.window_height,
			user_agent: self.user_agent.clone(),
			extra_args: Vec::new(),
		}
	}
}

/// Interactive login polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginSettings {
	pub poll_ms: u64,
	pub timeout_secs: u64,
}

impl Default for LoginSettings {
	fn default() -> Self {
		Self { poll_ms: 2000, timeout_secs: 180 }
	}
}

impl LoginSettings {
	pub fn poll(&self) -> Duration {
		Duration::from_millis(self.poll_ms.max(1))
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}
}

/// Browser waits used by the apply workflow, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeoutSettings {
	pub navigation_ms: u64,
	pub results_ms: u64,
	pub settle_ms: u64,
	pub detail_ms: u64,
	pub after_apply_ms: u64,
	pub between_listings_ms: u64,
}

impl Default for TimeoutSettings {
	fn default() -> Self {
		Self {
			navigation_ms: 30_000,
			results_ms: 10_000,
			settle_ms: 3000,
			detail_ms: 2000,
			after_apply_ms: 2000,
			between_listings_ms: 1000,
		}
	}
}

impl TimeoutSettings {
	pub fn navigation(&self) -> Duration {
		Duration::from_millis(self.navigation_ms)
	}

	pub fn results(&self) -> Duration {
		Duration::from_millis(self.results_ms)
	}

	pub fn settle(&self) -> Duration {
		Duration::from_millis(self.settle_ms)
	}

	pub fn detail(&self) -> Duration {
		Duration::from_millis(self.detail_ms)
	}

	pub fn after_apply(&self) -> Duration {
		Duration::from_millis(self.after_apply_ms)
	}

	pub fn between_listings(&self) -> Duration {
		Duration::from_millis(self.between_listings_ms)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentProvider {
	#[default]
	Lookup,
	Chat,
}

/// Intent resolver selection. `chat` talks to an OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentSettings {
	pub provider: IntentProvider,
	pub base_url: String,
	pub model: String,
	pub api_key_env: String,
}

impl Default for IntentSettings {
	fn default() -> Self {
		Self {
			provider: IntentProvider::Lookup,
			base_url: "https://api.deepseek.com".to_string(),
			model: "deepseek-chat".to_string(),
			api_key_env: "DEEPSEEK_API_KEY".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueLockSettings {
	pub timeout_ms: u64,
	pub stale_secs: u64,
}

impl Default for QueueLockSettings {
	fn default() -> Self {
		Self { timeout_ms: 5000, stale_secs: 30 }
	}
}

impl QueueLockSettings {
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}

	pub fn stale_after(&self) -> Duration {
		Duration::from_secs(self.stale_secs)
	}
}

impl Settings {
	/// Loads settings from `path`; a missing file means all defaults.
	pub fn load(path: &Path) -> Result<Self> {
		let content = match std::fs::read_to_string(path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
			Err(err) => return Err(EngineError::io(path, err)),
		};
		serde_json::from_str(&content).map_err(|err| EngineError::Settings {
			path: path.to_path_buf(),
			reason: err.to_string(),
		})
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn error_backoff(&self) -> Duration {
		Duration::from_millis(self.error_backoff_ms)
	}
}
