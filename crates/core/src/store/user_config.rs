use std::path::PathBuf;

use jobpilot_protocol::UserConfig;

use super::fs::load_json;
use crate::error::Result;
use crate::paths::StatePaths;

/// Read-only access to `user_config.json`, which the external API owns.
#[derive(Debug, Clone)]
pub struct UserConfigStore {
	path: PathBuf,
}

impl UserConfigStore {
	pub fn new(paths: &StatePaths) -> Self {
		Self { path: paths.user_config.clone() }
	}

	/// Current configuration; a missing file is an empty configuration.
	pub fn load(&self) -> Result<UserConfig> {
		Ok(load_json(&self.path)?.unwrap_or_default())
	}
}
