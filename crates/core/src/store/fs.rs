//! File helpers shared by the stores: atomic JSON writes and pid lock files.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};

const LOCK_RETRY: Duration = Duration::from_millis(25);

/// Replaces `path` with `content` via temp file, fsync and rename.
pub fn atomic_write_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
	let parent = path.parent().ok_or_else(|| std::io::Error::other("path has no parent"))?;
	fs::create_dir_all(parent)?;
	let tmp_name = format!(
		".{}.tmp-{}-{}",
		path.file_name().and_then(|v| v.to_str()).unwrap_or("state"),
		std::process::id(),
		SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0),
	);
	let tmp_path = parent.join(tmp_name);

	let written = (|| {
		let mut file = fs::OpenOptions::new().create_new(true).write(true).open(&tmp_path)?;
		file.write_all(content)?;
		file.sync_all()
	})();
	if let Err(err) = written {
		let _ = fs::remove_file(&tmp_path);
		return Err(err);
	}

	fs::rename(&tmp_path, path)?;
	sync_parent_dir(parent)?;
	Ok(())
}

#[cfg(unix)]
fn sync_parent_dir(parent: &Path) -> std::io::Result<()> {
	fs::File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
fn sync_parent_dir(_parent: &Path) -> std::io::Result<()> {
	Ok(())
}

/// Reads and parses `path`. A missing file is `Ok(None)`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
	let content = match fs::read_to_string(path) {
		Ok(content) => content,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
		Err(err) => return Err(EngineError::io(path, err)),
	};
	serde_json::from_str(&content).map(Some).map_err(|err| EngineError::json(path, err))
}

pub fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
	let content = serde_json::to_vec_pretty(data).map_err(|err| EngineError::json(path, err))?;
	atomic_write_file(path, &content).map_err(|err| EngineError::io(path, err))
}

/// Like [`save_json`], then restricts the file to its owner.
pub fn save_secret_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
	save_json(path, data)?;
	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|err| EngineError::io(path, err))?;
	}
	Ok(())
}

#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
	let Ok(pid) = libc::pid_t::try_from(pid) else {
		return false;
	};
	if pid <= 0 {
		return false;
	}
	// SAFETY: signal 0 only checks for existence and permission.
	let rc = unsafe { libc::kill(pid, 0) };
	rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub fn is_process_alive(_pid: u32) -> bool {
	true
}

pub fn read_lock_pid(path: &Path) -> Option<u32> {
	fs::read_to_string(path).ok().and_then(|raw| raw.trim().parse().ok())
}

/// Creates `path` exclusively and writes the current pid into it.
pub fn create_pid_file(path: &Path) -> std::io::Result<()> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	let mut file = fs::OpenOptions::new().create_new(true).write(true).open(path)?;
	file.write_all(std::process::id().to_string().as_bytes())?;
	file.sync_all()
}

/// Advisory lock held by the existence of a pid file; removed on drop.
#[derive(Debug)]
pub struct FileLock {
	path: PathBuf,
}

impl FileLock {
	/// Acquires the lock, breaking it when the owner is dead or the file is
	/// older than `stale_after`. Waits between attempts without blocking the
	/// runtime thread.
	pub async fn acquire(path: &Path, timeout: Duration, stale_after: Duration) -> Result<Self> {
		let started = Instant::now();
		loop {
			match create_pid_file(path) {
				Ok(()) => return Ok(Self { path: path.to_path_buf() }),
				Err(err) if err.kind() == ErrorKind::AlreadyExists => {
					if lock_is_stale(path, stale_after) {
						warn!(target = "jobpilot", path = %path.display(), "breaking stale lock");
						let _ = fs::remove_file(path);
						continue;
					}
					if started.elapsed() >= timeout {
						return Err(EngineError::QueueLock {
							path: path.to_path_buf(),
							ms: timeout.as_millis() as u64,
						});
					}
					tokio::time::sleep(LOCK_RETRY).await;
				}
				Err(err) => return Err(EngineError::io(path, err)),
			}
		}
	}
}

impl Drop for FileLock {
	fn drop(&mut self) {
		if let Err(err) = fs::remove_file(&self.path) {
			debug!(target = "jobpilot", path = %self.path.display(), error = %err, "lock file already gone");
		}
	}
}

fn lock_is_stale(path: &Path, stale_after: Duration) -> bool {
	if let Some(pid) = read_lock_pid(path) {
		if !is_process_alive(pid) {
			return true;
		}
	}
	fs::metadata(path)
		.and_then(|meta| meta.modified())
		.ok()
		.and_then(|modified| modified.elapsed().ok())
		.is_some_and(|age| age > stale_after)
}
