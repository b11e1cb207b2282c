//! The worker loop.
//!
//! Polls the queue for the oldest pending task, resolves its intent, hands it
//! to an [`ApplyRunner`] and writes status, progress and the result back. A
//! task that fails is marked `failed` and the loop moves on; queue or
//! configuration errors are logged and retried after a backoff. A final
//! status that could not be written is kept and retried before the next
//! task starts, so a finished task never stays `running`.

pub mod lease;
pub mod reconcile;
pub mod runner;

use std::future::Future;

use jobpilot_protocol::{ApplyParams, ProgressEvent, Task, TaskId, TaskPatch, TaskStatus, UserConfig};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::intent::{IntentResolver, resolve_intent};
use crate::settings::Settings;
use crate::store::{TaskQueue, UserConfigStore};

pub use lease::WorkerLease;
pub use reconcile::{ABANDONED_LOG, REQUEUED_LOG, reconcile_running};
pub use runner::{ApplyRunner, BrowserApplyRunner};

/// Progress band the workflow's 0-100 is mapped into.
const WORKFLOW_BAND: (u8, u8) = (20, 90);

pub struct Worker<R> {
	queue: TaskQueue,
	user_config: UserConfigStore,
	resolver: Box<dyn IntentResolver>,
	runner: R,
	settings: Settings,
	/// Final status of a finished task that could not be written yet.
	unwritten: Option<(TaskId, TaskPatch)>,
}

impl<R: ApplyRunner> Worker<R> {
	pub fn new(queue: TaskQueue, user_config: UserConfigStore, resolver: Box<dyn IntentResolver>, runner: R, settings: Settings) -> Self {
		Self {
			queue,
			user_config,
			resolver,
			runner,
			settings,
			unwritten: None,
		}
	}

	pub fn runner(&self) -> &R {
		&self.runner
	}

	/// Runs until `shutdown` resolves, then shuts the runner down. A task
	/// interrupted mid-run stays `running` for the next start to reconcile.
	pub async fn run(&mut self, shutdown: impl Future<Output = ()>) {
		match reconcile_running(&self.queue, self.settings.stale_running).await {
			Ok(0) => {}
			Ok(n) => info!(target = "jobpilot", tasks = n, policy = ?self.settings.stale_running, "reconciled abandoned tasks"),
			Err(err) => warn!(target = "jobpilot", error = %err, "startup reconciliation failed"),
		}

		tokio::pin!(shutdown);
		info!(target = "jobpilot", poll_ms = self.settings.poll_interval_ms, "worker started");

		loop {
			let pause = tokio::select! {
				_ = &mut shutdown => break,
				outcome = self.tick() => match outcome {
					Ok(_) => self.settings.poll_interval(),
					Err(err) => {
						warn!(target = "jobpilot", error = %err, class = ?err.class(), "worker loop error, backing off");
						self.settings.error_backoff()
					}
				},
			};

			tokio::select! {
				_ = &mut shutdown => break,
				_ = tokio::time::sleep(pause) => {}
			}
		}

		info!(target = "jobpilot", "worker stopping");
		if let Err(err) = self.flush_unwritten().await {
			warn!(target = "jobpilot", error = %err, "final task status still unwritten at shutdown");
		}
		self.runner.shutdown().await;
	}

	/// Runs the oldest pending task, if any. Returns whether one ran.
	///
	/// A final status left over from an earlier tick is written first; until
	/// it lands no new task is started.
	pub async fn tick(&mut self) -> Result<bool> {
		self.flush_unwritten().await?;
		self.queue.fail_invalid_pending().await?;
		let Some(task) = self.queue.oldest_pending()? else {
			return Ok(false);
		};
		self.execute(task).await?;
		Ok(true)
	}

	async fn flush_unwritten(&mut self) -> Result<()> {
		let Some((id, patch)) = self.unwritten.take() else {
			return Ok(());
		};
		match self.queue.update(&id, patch.clone()).await {
			Ok(task) => {
				info!(target = "jobpilot", id = %id, status = %task.status, "wrote deferred task status");
				Ok(())
			}
			Err(err @ (EngineError::TaskNotFound(_) | EngineError::InvalidTransition { .. })) => {
				warn!(target = "jobpilot", id = %id, error = %err, "dropping deferred task status");
				Ok(())
			}
			Err(err) => {
				self.unwritten = Some((id, patch));
				Err(err)
			}
		}
	}

	async fn execute(&mut self, task: Task) -> Result<()> {
		let id = task.id.clone();
		info!(target = "jobpilot", id = %id, title = %task.title, "starting task");
		self.queue
			.update(&id, TaskPatch::new().status(TaskStatus::Running).progress(10).log("resolving intent"))
			.await?;

		let user = self.user_config.load().unwrap_or_else(|err| {
			warn!(target = "jobpilot", error = %err, "user config unreadable, ignoring it");
			UserConfig::default()
		});
		let intent = resolve_intent(self.resolver.as_ref(), &task.intent_text(), &user, &self.settings.defaults).await;
		debug!(target = "jobpilot", id = %id, keyword = %intent.keyword, city = %intent.city, count = intent.count, "intent resolved");

		self.queue
			.update(
				&id,
				TaskPatch::new()
					.progress(WORKFLOW_BAND.0)
					.log(format!("applying to {} {} listings in {}", intent.count, intent.keyword, intent.city))
					.apply_params(ApplyParams {
						keyword: Some(intent.keyword.clone()),
						city: Some(intent.city.clone()),
						count: Some(intent.count),
						applied: None,
					}),
			)
			.await?;

		let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressEvent>();
		let mut on_progress = move |event: ProgressEvent| {
			let _ = progress_tx.send(event);
		};

		let queue = &self.queue;
		let outcome = {
			let run = self.runner.run(&intent, &mut on_progress);
			tokio::pin!(run);
			loop {
				tokio::select! {
					biased;
					Some(event) = progress_rx.recv() => record_progress(queue, &id, event).await,
					outcome = &mut run => break outcome,
				}
			}
		};
		while let Ok(event) = progress_rx.try_recv() {
			record_progress(queue, &id, event).await;
		}

		let patch = match outcome {
			Ok(report) => {
				info!(target = "jobpilot", id = %id, report = %report, "task completed");
				TaskPatch::new()
					.status(TaskStatus::Completed)
					.progress(100)
					.log(report.to_string())
					.apply_params(ApplyParams {
						applied: Some(report.applied as u32),
						..Default::default()
					})
			}
			Err(err) => {
				warn!(target = "jobpilot", id = %id, error = %err, class = ?err.class(), "task failed");
				TaskPatch::new().status(TaskStatus::Failed).log(err.to_string())
			}
		};

		if let Err(err) = self.queue.update(&id, patch.clone()).await {
			warn!(target = "jobpilot", id = %id, error = %err, "final task status not written, retrying next tick");
			self.unwritten = Some((id, patch));
			return Err(err);
		}
		Ok(())
	}
}

async fn record_progress(queue: &TaskQueue, id: &TaskId, event: ProgressEvent) {
	let patch = TaskPatch::new().progress(event.rescale(WORKFLOW_BAND.0, WORKFLOW_BAND.1)).log(event.message);
	if let Err(err) = queue.update(id, patch).await {
		warn!(target = "jobpilot", id = %id, error = %err, "failed to record progress");
	}
}
