use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::store::fs::{create_pid_file, is_process_alive, read_lock_pid};

/// Exclusive claim on the data directory for one worker process.
#[derive(Debug)]
pub struct WorkerLease {
	path: PathBuf,
}

impl WorkerLease {
	/// Takes `path`, reclaiming it when the recorded owner is gone.
	pub fn acquire(path: &Path) -> Result<Self> {
		loop {
			match create_pid_file(path) {
				Ok(()) => {
					debug!(target = "jobpilot", path = %path.display(), "worker lease acquired");
					return Ok(Self { path: path.to_path_buf() });
				}
				Err(err) if err.kind() == ErrorKind::AlreadyExists => match read_lock_pid(path) {
					Some(pid) if is_process_alive(pid) => {
						return Err(EngineError::WorkerLeaseHeld { path: path.to_path_buf(), pid });
					}
					owner => {
						warn!(target = "jobpilot", path = %path.display(), pid = ?owner, "reclaiming worker lease");
						match fs::remove_file(path) {
							Ok(()) => {}
							Err(err) if err.kind() == ErrorKind::NotFound => {}
							Err(err) => return Err(EngineError::io(path, err)),
						}
					}
				},
				Err(err) => return Err(EngineError::io(path, err)),
			}
		}
	}
}

impl Drop for WorkerLease {
	fn drop(&mut self) {
		let _ = fs::remove_file(&self.path);
	}
}

#[cfg(all(test, unix))]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn live_owner_blocks_second_worker() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("worker.lock");

		let lease = WorkerLease::acquire(&path).unwrap();
		let err = WorkerLease::acquire(&path).unwrap_err();
		assert!(matches!(err, EngineError::WorkerLeaseHeld { pid, .. } if pid == std::process::id()));

		drop(lease);
		assert!(!path.exists());
		WorkerLease::acquire(&path).unwrap();
	}

	#[test]
	fn dead_owner_is_reclaimed() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("worker.lock");
		fs::write(&path, u32::MAX.to_string()).unwrap();

		let _lease = WorkerLease::acquire(&path).unwrap();
		assert_eq!(read_lock_pid(&path), Some(std::process::id()));
	}
}
