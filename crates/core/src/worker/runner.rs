use async_trait::async_trait;
use jobpilot_protocol::{ApplyIntent, ProgressEvent};
use jobpilot_runtime::Launcher;
use tokio::sync::watch;
use tracing::warn;

use crate::error::Result;
use crate::session::{SessionManager, SessionState};
use crate::workflow::{ApplyReport, ApplyWorkflow};

/// Executes one resolved apply intent.
#[async_trait]
pub trait ApplyRunner: Send {
	async fn run(&mut self, intent: &ApplyIntent, on_progress: &mut (dyn FnMut(ProgressEvent) + Send)) -> Result<ApplyReport>;

	/// Releases whatever the runner holds. Called once when the worker exits.
	async fn shutdown(&mut self) {}
}

/// Runs the apply workflow in a browser that is launched on first use and
/// kept across tasks.
pub struct BrowserApplyRunner<L: Launcher> {
	session: SessionManager<L>,
}

impl<L: Launcher> BrowserApplyRunner<L> {
	pub fn new(session: SessionManager<L>) -> Self {
		Self { session }
	}

	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.session.subscribe()
	}
}

#[async_trait]
impl<L: Launcher> ApplyRunner for BrowserApplyRunner<L> {
	async fn run(&mut self, intent: &ApplyIntent, on_progress: &mut (dyn FnMut(ProgressEvent) + Send)) -> Result<ApplyReport> {
		let result = ApplyWorkflow::new(&mut self.session)
			.apply(&intent.keyword, &intent.city, intent.count, on_progress)
			.await;

		if let Err(err) = &result {
			if err.needs_browser_restart() {
				warn!(target = "jobpilot", error = %err, "browser unusable, restarting before next task");
				self.session.stop().await;
			}
		}
		result
	}

	async fn shutdown(&mut self) {
		self.session.stop().await;
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;
	use crate::paths::StatePaths;
	use crate::settings::Settings;
	use crate::store::{SessionStore, UserConfigStore};
	use crate::testing::{FakeLauncher, FakeSite, Listing};

	fn runner(site: &FakeSite, tmp: &TempDir) -> BrowserApplyRunner<FakeLauncher> {
		let paths = StatePaths::new(tmp.path());
		BrowserApplyRunner::new(SessionManager::new(
			site.launcher(),
			&Settings::default(),
			SessionStore::new(&paths),
			UserConfigStore::new(&paths),
		))
	}

	fn intent(count: u32) -> ApplyIntent {
		ApplyIntent {
			keyword: "产品经理".into(),
			city: "北京".into(),
			count,
		}
	}

	#[tokio::test(start_paused = true)]
	async fn keeps_one_browser_across_tasks() {
		let tmp = TempDir::new().unwrap();
		let site = FakeSite::default().logged_in().listings(vec![Listing::new("a"), Listing::new("b")]);
		let mut runner = runner(&site, &tmp);

		assert_eq!(site.state().launches, 0);
		runner.run(&intent(1), &mut |_| {}).await.unwrap();
		runner.run(&intent(1), &mut |_| {}).await.unwrap();
		assert_eq!(site.state().launches, 1);

		runner.shutdown().await;
		assert_eq!(site.state().closed_browsers, 1);
		assert_eq!(*runner.subscribe().borrow(), SessionState::Stopped);
	}

	#[tokio::test(start_paused = true)]
	async fn browser_failure_relaunches_on_next_task() {
		let tmp = TempDir::new().unwrap();
		let site = FakeSite::default().logged_in().listings(vec![Listing::new("a")]);
		let mut runner = runner(&site, &tmp);

		runner.run(&intent(1), &mut |_| {}).await.unwrap();
		site.state().disconnected = true;
		assert!(runner.run(&intent(1), &mut |_| {}).await.is_err());
		assert_eq!(site.state().closed_browsers, 1);

		let report = runner.run(&intent(1), &mut |_| {}).await.unwrap();
		assert_eq!(report.applied, 1);
		assert_eq!(site.state().launches, 2);
	}
}
