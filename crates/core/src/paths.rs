//! Locations of the engine's files inside the data directory.

use std::path::{Path, PathBuf};

/// Environment variable naming the data directory.
pub const HOME_ENV: &str = "JOBPILOT_HOME";

/// File paths for engine state.
///
/// Everything lives directly under one data directory shared with the
/// external API process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
	pub root: PathBuf,
	pub tasks: PathBuf,
	pub tasks_lock: PathBuf,
	pub user_config: PathBuf,
	pub cookies: PathBuf,
	pub settings: PathBuf,
	pub worker_lock: PathBuf,
}

impl StatePaths {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		let root = root.into();
		Self {
			tasks: root.join("tasks.json"),
			tasks_lock: root.join("tasks.json.lock"),
			user_config: root.join("user_config.json"),
			cookies: root.join("cookies.json"),
			settings: root.join("settings.json"),
			worker_lock: root.join("worker.lock"),
			root,
		}
	}

	/// Resolves the data directory: explicit flag, then `$JOBPILOT_HOME`,
	/// then the platform data directory.
	pub fn resolve(explicit: Option<&Path>) -> Self {
		let root = explicit
			.map(Path::to_path_buf)
			.or_else(|| std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))
			.or_else(|| dirs::data_dir().map(|d| d.join("jobpilot")))
			.unwrap_or_else(|| PathBuf::from(".jobpilot"));
		Self::new(root)
	}
}
