//! The task queue file (`tasks.json`).
//!
//! The file is a JSON array shared with the external API process, which
//! inserts new records at the front. Every read-modify-write here runs under
//! an in-process mutex plus the `tasks.json.lock` pid file, and every write
//! replaces the file atomically. Entries that do not parse as a known task
//! are carried through rewrites untouched.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::PathBuf;

use jobpilot_protocol::{NewTask, Task, TaskId, TaskPatch, TaskStatus};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::fs::{FileLock, load_json, save_json};
use crate::error::{EngineError, Result};
use crate::paths::StatePaths;
use crate::settings::QueueLockSettings;

/// One element of the queue array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueueEntry {
	Task(Task),
	/// A record this engine does not understand, kept verbatim.
	Other(Value),
}

impl QueueEntry {
	pub fn as_task(&self) -> Option<&Task> {
		match self {
			QueueEntry::Task(task) => Some(task),
			QueueEntry::Other(_) => None,
		}
	}
}

pub struct TaskQueue {
	path: PathBuf,
	lock_path: PathBuf,
	lock: QueueLockSettings,
	guard: AsyncMutex<()>,
	reported: Mutex<HashSet<String>>,
}

impl TaskQueue {
	pub fn new(paths: &StatePaths, lock: QueueLockSettings) -> Self {
		Self {
			path: paths.tasks.clone(),
			lock_path: paths.tasks_lock.clone(),
			lock,
			guard: AsyncMutex::new(()),
			reported: Mutex::new(HashSet::new()),
		}
	}

	/// Every entry in file order, including ones that are not known tasks.
	pub fn entries(&self) -> Result<Vec<QueueEntry>> {
		Ok(load_json::<Vec<QueueEntry>>(&self.path)?.unwrap_or_default())
	}

	pub fn list(&self) -> Result<Vec<Task>> {
		Ok(self.entries()?.into_iter().filter_map(|entry| match entry {
			QueueEntry::Task(task) => Some(task),
			QueueEntry::Other(_) => None,
		}).collect())
	}

	pub fn running(&self) -> Result<Vec<Task>> {
		Ok(self.list()?.into_iter().filter(|task| task.status == TaskStatus::Running).collect())
	}

	/// The pending task with the earliest `created_at`. Producers insert at
	/// the front, so among equal timestamps the later array position wins.
	pub fn oldest_pending(&self) -> Result<Option<Task>> {
		let entries = self.entries()?;
		self.report_unknown(&entries);

		Ok(entries
			.into_iter()
			.enumerate()
			.filter_map(|(index, entry)| match entry {
				QueueEntry::Task(task) if task.status == TaskStatus::Pending => Some((index, task)),
				_ => None,
			})
			.min_by(|(ia, a), (ib, b)| (&a.created_at, Reverse(ia)).cmp(&(&b.created_at, Reverse(ib))))
			.map(|(_, task)| task))
	}

	/// Inserts a new pending task at the front of the queue.
	pub async fn enqueue(&self, new: NewTask) -> Result<Task> {
		self.modify(|entries| {
			let taken: HashSet<&str> = entries.iter().filter_map(QueueEntry::as_task).map(|task| task.id.as_str()).collect();
			let id = loop {
				let id = new_task_id();
				if !taken.contains(id.as_str()) {
					break id;
				}
			};
			let created_at = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
			let task = Task::from_new(id, created_at, new);
			entries.insert(0, QueueEntry::Task(task.clone()));
			debug!(target = "jobpilot", id = %task.id, "task enqueued");
			Ok(task)
		})
		.await
	}

	/// Merges `patch` into task `id` and returns the updated record.
	pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task> {
		self.modify(|entries| {
			if patch.status == Some(TaskStatus::Running) {
				let other = entries.iter().filter_map(QueueEntry::as_task).find(|task| task.status == TaskStatus::Running && &task.id != id);
				if let Some(other) = other {
					return Err(anyhow::anyhow!("task {} is already running", other.id).into());
				}
			}
			let task = find_task(entries, id)?;
			task.apply_patch(patch).map_err(|source| EngineError::InvalidTransition { id: id.clone(), source })?;
			Ok(task.clone())
		})
		.await
	}

	/// Moves a `running` task back to `pending`.
	pub async fn requeue(&self, id: &TaskId, log: &str) -> Result<Task> {
		self.modify(|entries| {
			let task = find_task(entries, id)?;
			if task.status != TaskStatus::Running {
				return Err(EngineError::InvalidTransition {
					id: id.clone(),
					source: jobpilot_protocol::TransitionError {
						from: task.status,
						to: TaskStatus::Pending,
					},
				});
			}
			task.requeue(log);
			Ok(task.clone())
		})
		.await
	}

	/// Marks pending `apply` records that cannot be read as tasks `failed`,
	/// so a producer's malformed record does not sit in the queue forever.
	/// Returns how many were marked.
	pub async fn fail_invalid_pending(&self) -> Result<usize> {
		if !self.entries()?.iter().any(is_invalid_pending_apply) {
			return Ok(0);
		}
		self.modify(|entries| {
			let mut failed = 0;
			for entry in entries.iter_mut() {
				if !is_invalid_pending_apply(entry) {
					continue;
				}
				if let QueueEntry::Other(Value::Object(record)) = entry {
					let reason = invalid_field(record);
					warn!(target = "jobpilot", id = ?record.get("id"), reason = %reason, "failing unreadable task record");
					record.insert("status".to_string(), Value::from(TaskStatus::Failed.as_str()));
					record.insert("log".to_string(), Value::from(format!("invalid task record: {reason}")));
					failed += 1;
				}
			}
			Ok(failed)
		})
		.await
	}

	async fn modify<R>(&self, f: impl FnOnce(&mut Vec<QueueEntry>) -> Result<R>) -> Result<R> {
		let _guard = self.guard.lock().await;
		let _lock = FileLock::acquire(&self.lock_path, self.lock.timeout(), self.lock.stale_after()).await?;
		let mut entries = self.entries()?;
		let result = f(&mut entries)?;
		save_json(&self.path, &entries)?;
		Ok(result)
	}

	fn report_unknown(&self, entries: &[QueueEntry]) {
		let mut reported = self.reported.lock();
		for entry in entries {
			if let QueueEntry::Other(value) = entry {
				let key = value.get("id").map(Value::to_string).unwrap_or_else(|| value.to_string());
				if reported.insert(key.clone()) {
					warn!(target = "jobpilot", entry = %key, "skipping queue entry that is not a known task");
				}
			}
		}
	}
}

fn is_invalid_pending_apply(entry: &QueueEntry) -> bool {
	match entry {
		QueueEntry::Other(Value::Object(record)) => {
			record.get("type").and_then(Value::as_str) == Some("apply") && record.get("status").and_then(Value::as_str) == Some(TaskStatus::Pending.as_str())
		}
		_ => false,
	}
}

/// Names the first field that keeps `record` from reading as a task.
fn invalid_field(record: &serde_json::Map<String, Value>) -> String {
	for key in ["id", "title", "description"] {
		match record.get(key) {
			Some(Value::String(_)) => {}
			Some(_) => return format!("field `{key}` is not a string"),
			None => return format!("missing field `{key}`"),
		}
	}
	for key in ["log", "created_at"] {
		if record.get(key).is_some_and(|value| !value.is_string()) {
			return format!("field `{key}` is not a string");
		}
	}
	if record.get("progress").is_some_and(|value| value.as_u64().is_none_or(|n| n > u64::from(u8::MAX))) {
		return "field `progress` is not a percentage".to_string();
	}
	match serde_json::from_value::<Task>(Value::Object(record.clone())) {
		Err(err) => err.to_string(),
		Ok(_) => "unreadable record".to_string(),
	}
}

fn find_task<'a>(entries: &'a mut [QueueEntry], id: &TaskId) -> Result<&'a mut Task> {
	entries
		.iter_mut()
		.find_map(|entry| match entry {
			QueueEntry::Task(task) if &task.id == id => Some(task),
			_ => None,
		})
		.ok_or_else(|| EngineError::TaskNotFound(id.clone()))
}

fn new_task_id() -> TaskId {
	let simple = uuid::Uuid::new_v4().simple().to_string();
	TaskId::new(&simple[..8])
}
