//! Task records stored in `tasks.json`.
//!
//! A [`Task`] carries the fields common to every task plus a closed
//! [`TaskKind`] selected by the `type` tag. Status changes go through
//! [`Task::apply_patch`], which enforces the lifecycle
//! `pending -> running -> {completed, failed}` and keeps `progress`
//! non-decreasing while a task runs.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Log line written on freshly enqueued tasks.
pub const WAITING_LOG: &str = "waiting to run";

/// Opaque task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TaskId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(&self.0)
	}
}

impl From<&str> for TaskId {
	fn from(value: &str) -> Self {
		Self(value.to_string())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
	#[default]
	Pending,
	Running,
	Completed,
	Failed,
}

impl TaskStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			TaskStatus::Pending => "pending",
			TaskStatus::Running => "running",
			TaskStatus::Completed => "completed",
			TaskStatus::Failed => "failed",
		}
	}

	/// Returns true when `next` is reachable from `self` (staying put is allowed).
	pub fn can_transition_to(self, next: TaskStatus) -> bool {
		self == next
			|| matches!(
				(self, next),
				(TaskStatus::Pending, TaskStatus::Running) | (TaskStatus::Running, TaskStatus::Completed) | (TaskStatus::Running, TaskStatus::Failed)
			)
	}
}

impl fmt::Display for TaskStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.pad(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task status cannot move from {from} to {to}")]
pub struct TransitionError {
	pub from: TaskStatus,
	pub to: TaskStatus,
}

/// Parameters of an `apply` task, filled in once the intent is resolved.
///
/// Producers may write these before the worker does, with loose types
/// (`"count": "3"`, `"keyword": null`). Values that cannot be used read as
/// unset rather than rejecting the whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyParams {
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub keyword: Option<String>,
	#[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
	pub count: Option<u32>,
	/// Number of listings contacted, set when the task completes.
	#[serde(default, deserialize_with = "lenient_count", skip_serializing_if = "Option::is_none")]
	pub applied: Option<u32>,
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::String(text) => Some(text),
		_ => None,
	})
}

/// A number or a numeric string.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	})
}

impl ApplyParams {
	fn merge(&mut self, other: ApplyParams) {
		if other.keyword.is_some() {
			self.keyword = other.keyword;
		}
		if other.city.is_some() {
			self.city = other.city;
		}
		if other.count.is_some() {
			self.count = other.count;
		}
		if other.applied.is_some() {
			self.applied = other.applied;
		}
	}
}

/// Task variants, tagged by the record's `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
	Apply(ApplyParams),
}

impl TaskKind {
	pub fn name(&self) -> &'static str {
		match self {
			TaskKind::Apply(_) => "apply",
		}
	}
}

impl Default for TaskKind {
	fn default() -> Self {
		TaskKind::Apply(ApplyParams::default())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
	pub id: TaskId,
	pub status: TaskStatus,
	pub title: String,
	pub description: String,
	#[serde(default)]
	pub progress: u8,
	#[serde(default)]
	pub log: String,
	/// Local time formatted `YYYY-MM-DD HH:MM`.
	#[serde(default)]
	pub created_at: String,
	#[serde(flatten)]
	pub kind: TaskKind,
}

/// Producer-side input for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
	pub kind: TaskKind,
	pub title: String,
	pub description: String,
}

impl NewTask {
	pub fn apply(title: impl Into<String>, description: impl Into<String>) -> Self {
		Self {
			kind: TaskKind::Apply(ApplyParams::default()),
			title: title.into(),
			description: description.into(),
		}
	}
}

impl Task {
	/// Builds a pending record from producer input.
	pub fn from_new(id: TaskId, created_at: impl Into<String>, new: NewTask) -> Self {
		Self {
			id,
			status: TaskStatus::Pending,
			title: new.title,
			description: new.description,
			progress: 0,
			log: WAITING_LOG.to_string(),
			created_at: created_at.into(),
			kind: new.kind,
		}
	}

	/// Text handed to intent resolution: title and description joined by a space.
	pub fn intent_text(&self) -> String {
		format!("{} {}", self.title, self.description).trim().to_string()
	}

	pub fn apply_params(&self) -> Option<&ApplyParams> {
		match &self.kind {
			TaskKind::Apply(params) => Some(params),
		}
	}

	/// Merges `patch` into this record.
	///
	/// Rejects transitions outside the task lifecycle. Progress is capped at
	/// 100 and never moves backwards while the task is running.
	pub fn apply_patch(&mut self, patch: TaskPatch) -> Result<(), TransitionError> {
		if let Some(next) = patch.status {
			if !self.status.can_transition_to(next) {
				return Err(TransitionError { from: self.status, to: next });
			}
			self.status = next;
		}

		if let Some(progress) = patch.progress {
			let progress = progress.min(100);
			self.progress = if self.status == TaskStatus::Running { self.progress.max(progress) } else { progress };
		}

		if let Some(log) = patch.log {
			self.log = log;
		}

		if let Some(params) = patch.apply {
			match &mut self.kind {
				TaskKind::Apply(current) => current.merge(params),
			}
		}

		Ok(())
	}

	/// Puts an abandoned running task back in the queue.
	///
	/// This is the only way back to `pending`; it exists for startup
	/// reconciliation after a crashed worker.
	pub fn requeue(&mut self, log: impl Into<String>) {
		self.status = TaskStatus::Pending;
		self.progress = 0;
		self.log = log.into();
	}
}

/// Partial update for a [`Task`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
	pub status: Option<TaskStatus>,
	pub progress: Option<u8>,
	pub log: Option<String>,
	pub apply: Option<ApplyParams>,
}

impl TaskPatch {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn status(mut self, status: TaskStatus) -> Self {
		self.status = Some(status);
		self
	}

	pub fn progress(mut self, progress: u8) -> Self {
		self.progress = Some(progress);
		self
	}

	pub fn log(mut self, log: impl Into<String>) -> Self {
		self.log = Some(log.into());
		self
	}

	pub fn apply_params(mut self, params: ApplyParams) -> Self {
		self.apply = Some(params);
		self
	}
}
