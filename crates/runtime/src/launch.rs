use std::path::PathBuf;

/// Desktop Chrome user agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str =
	"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Blink switch that drops the most obvious automation markers.
pub const AUTOMATION_FLAG: &str = "--disable-blink-features=AutomationControlled";

/// Init script run before any page script to hide `navigator.webdriver`.
pub const STEALTH_SCRIPT: &str = "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// How to start the browser process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
	pub headless: bool,
	/// Browser binary; autodetected when `None`.
	pub executable: Option<PathBuf>,
	pub window_width: u32,
	pub window_height: u32,
	pub user_agent: String,
	pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
	fn default() -> Self {
		Self {
			headless: false,
			executable: None,
			window_width: 1280,
			window_height: 900,
			user_agent: DEFAULT_USER_AGENT.to_string(),
			extra_args: Vec::new(),
		}
	}
}

impl LaunchOptions {
	/// Command-line switches passed to the browser.
	pub fn args(&self) -> Vec<String> {
		let mut args = vec![
			AUTOMATION_FLAG.to_string(),
			format!("--user-agent={}", self.user_agent),
			"--no-first-run".to_string(),
			"--no-default-browser-check".to_string(),
		];
		args.extend(self.extra_args.iter().cloned());
		args
	}
}
