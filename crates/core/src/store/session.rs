//! Persisted session credential (`cookies.json`).

use std::path::PathBuf;

use jobpilot_protocol::SessionCredential;
use tracing::{debug, warn};

use super::fs::{load_json, save_secret_json};
use crate::paths::StatePaths;

/// Cookie store for the single automated account.
///
/// Failures never propagate: a credential that cannot be read is treated as
/// absent and a failed save is logged.
#[derive(Debug, Clone)]
pub struct SessionStore {
	path: PathBuf,
}

impl SessionStore {
	pub fn new(paths: &StatePaths) -> Self {
		Self { path: paths.cookies.clone() }
	}

	pub fn load(&self) -> Option<SessionCredential> {
		match load_json::<SessionCredential>(&self.path) {
			Ok(Some(credential)) if !credential.is_empty() => {
				debug!(target = "jobpilot", cookies = credential.len(), "session credential loaded");
				Some(credential)
			}
			Ok(_) => None,
			Err(err) => {
				warn!(target = "jobpilot", error = %err, "ignoring unreadable session credential");
				None
			}
		}
	}

	pub fn save(&self, credential: &SessionCredential) {
		match save_secret_json(&self.path, credential) {
			Ok(()) => debug!(target = "jobpilot", cookies = credential.len(), "session credential saved"),
			Err(err) => warn!(target = "jobpilot", error = %err, "failed to save session credential"),
		}
	}
}
