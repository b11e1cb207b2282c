use jobpilot_protocol::{TaskPatch, TaskStatus};
use tracing::{info, warn};

use crate::error::Result;
use crate::settings::StaleRunningPolicy;
use crate::store::TaskQueue;

pub const ABANDONED_LOG: &str = "abandoned: worker stopped while task was running";
pub const REQUEUED_LOG: &str = "requeued: worker stopped while task was running";

/// Resolves tasks left `running` by a previous worker process. Returns how
/// many were touched.
pub async fn reconcile_running(queue: &TaskQueue, policy: StaleRunningPolicy) -> Result<usize> {
	let stale = queue.running()?;
	for task in &stale {
		match policy {
			StaleRunningPolicy::Fail => {
				queue.update(&task.id, TaskPatch::new().status(TaskStatus::Failed).log(ABANDONED_LOG)).await?;
				warn!(target = "jobpilot", id = %task.id, "marked abandoned task failed");
			}
			StaleRunningPolicy::Requeue => {
				queue.requeue(&task.id, REQUEUED_LOG).await?;
				info!(target = "jobpilot", id = %task.id, "requeued abandoned task");
			}
		}
	}
	Ok(stale.len())
}
