//! Operator-facing messages on stderr.

use jobpilot::{SessionState, Settings, StatePaths};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub fn print_banner(paths: &StatePaths, settings: &Settings) {
	eprintln!("jobpilot {}", env!("CARGO_PKG_VERSION"));
	eprintln!("  data dir : {}", paths.root.display());
	eprintln!("  poll     : every {}ms", settings.poll_interval_ms);
	eprintln!("  browser  : {}", if settings.browser.headless { "headless" } else { "windowed" });
	eprintln!("Press Ctrl-C to stop.");
}

/// Follows the session state and tells the operator when the browser is
/// waiting for them.
pub fn watch_session(mut rx: watch::Receiver<SessionState>, timeout_secs: u64) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut awaiting = false;
		while rx.changed().await.is_ok() {
			let state = rx.borrow_and_update().clone();
			match state {
				SessionState::AwaitingUserVerification => {
					awaiting = true;
					eprintln!();
					eprintln!(">>> Login required. Complete the SMS verification in the browser window.");
					eprintln!(">>> Waiting up to {timeout_secs}s.");
					eprintln!();
				}
				SessionState::LoggedIn if awaiting => {
					awaiting = false;
					eprintln!(">>> Logged in. Session saved.");
				}
				SessionState::LoginFailed(reason) => {
					awaiting = false;
					eprintln!(">>> Login failed: {reason}");
				}
				_ => {}
			}
		}
	})
}
