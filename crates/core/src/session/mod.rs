//! Browser session manager.
//!
//! Owns the single browser process used by the engine, restores and
//! persists the session credential, and drives login-state detection and
//! the interactive SMS login. Every state change is published on a watch
//! channel so the CLI can tell the operator when verification is pending.

pub mod probe;

use jobpilot_protocol::SessionCredential;
use jobpilot_runtime::{Browser, LaunchOptions, Launcher, Node, Surface};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::settings::{LoginSettings, Settings, TimeoutSettings};
use crate::site;
use crate::store::{SessionStore, UserConfigStore};

pub use probe::{Check, LoginProbe};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
	Uninitialized,
	Ready,
	LoggedIn,
	LoggedOut,
	AwaitingUserVerification,
	LoginFailed(String),
	Stopped,
}

impl SessionState {
	pub fn label(&self) -> &str {
		match self {
			SessionState::Uninitialized => "uninitialized",
			SessionState::Ready => "ready",
			SessionState::LoggedIn => "logged in",
			SessionState::LoggedOut => "logged out",
			SessionState::AwaitingUserVerification => "awaiting user verification",
			SessionState::LoginFailed(reason) => reason,
			SessionState::Stopped => "stopped",
		}
	}
}

pub struct SessionManager<L: Launcher> {
	launcher: L,
	options: LaunchOptions,
	login: LoginSettings,
	timeouts: TimeoutSettings,
	store: SessionStore,
	user_config: UserConfigStore,
	browser: Option<L::Browser>,
	state: watch::Sender<SessionState>,
}

impl<L: Launcher> SessionManager<L> {
	pub fn new(launcher: L, settings: &Settings, store: SessionStore, user_config: UserConfigStore) -> Self {
		let (state, _) = watch::channel(SessionState::Uninitialized);
		Self {
			launcher,
			options: settings.browser.launch_options(),
			login: settings.login.clone(),
			timeouts: settings.timeouts.clone(),
			store,
			user_config,
			browser: None,
			state,
		}
	}

	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.state.subscribe()
	}

	pub fn state(&self) -> SessionState {
		self.state.borrow().clone()
	}

	pub fn timeouts(&self) -> &TimeoutSettings {
		&self.timeouts
	}

	pub fn is_started(&self) -> bool {
		self.browser.is_some()
	}

	fn set_state(&self, next: SessionState) {
		debug!(target = "jobpilot", state = next.label(), "session state");
		self.state.send_replace(next);
	}

	/// The running browser.
	pub fn browser(&self) -> Result<&L::Browser> {
		self.browser.as_ref().ok_or_else(|| EngineError::Anyhow(anyhow::anyhow!("browser session not started")))
	}

	/// Launches the browser and restores the saved credential. No-op when
	/// already running.
	pub async fn start(&mut self) -> Result<()> {
		if self.browser.is_some() {
			return Ok(());
		}

		let browser = self.launcher.launch(&self.options).await?;
		if let Some(credential) = self.store.load() {
			match browser.set_cookies(&credential.cookies).await {
				Ok(()) => info!(target = "jobpilot", cookies = credential.len(), "restored saved session"),
				Err(err) => warn!(target = "jobpilot", error = %err, "failed to restore saved session"),
			}
		}
		self.browser = Some(browser);
		self.set_state(SessionState::Ready);
		Ok(())
	}

	/// Runs the login probes against the main surface without navigating.
	pub async fn probe(&self) -> Result<bool> {
		let surface = self.browser()?.main_surface();
		let passed = probe::first_passing(probe::LOGIN_PROBES, surface).await;
		if let Some(name) = passed {
			debug!(target = "jobpilot", probe = name, "login probe passed");
		}
		Ok(passed.is_some())
	}

	/// Ensures the session is logged in, running the interactive login when
	/// it is not. Returns false when login could not be completed.
	pub async fn ensure_logged_in(&mut self) -> Result<bool> {
		login_outcome(self.require_login().await)
	}

	/// Like [`ensure_logged_in`](Self::ensure_logged_in) but reports why login failed.
	pub async fn require_login(&mut self) -> Result<()> {
		self.start().await?;
		self.set_state(SessionState::Ready);

		let surface = self.browser()?.main_surface();
		if let Err(err) = surface.goto(&site::job_home_url(), self.timeouts.navigation()).await {
			if err.is_browser_level() {
				return Err(err.into());
			}
			warn!(target = "jobpilot", error = %err, "job page navigation failed, probing anyway");
		}
		tokio::time::sleep(self.timeouts.settle()).await;

		if self.probe().await? {
			self.set_state(SessionState::LoggedIn);
			return Ok(());
		}

		info!(target = "jobpilot", "not logged in");
		self.set_state(SessionState::LoggedOut);
		self.perform_login().await
	}

	/// Runs the interactive login. Returns false on timeout or when the
	/// login page cannot be opened.
	pub async fn login(&mut self) -> Result<bool> {
		login_outcome(self.perform_login().await)
	}

	pub(crate) async fn perform_login(&mut self) -> Result<()> {
		self.start().await?;
		let browser = self.browser()?;
		let surface = browser.main_surface();

		if let Err(err) = surface.goto(&site::login_url(), self.timeouts.navigation()).await {
			if err.is_browser_level() {
				return Err(err.into());
			}
			warn!(target = "jobpilot", error = %err, "login page unavailable");
			self.set_state(SessionState::LoginFailed("login page unavailable".to_string()));
			return Err(EngineError::LoginUnavailable);
		}
		tokio::time::sleep(self.timeouts.settle()).await;

		match self.login_phone() {
			Some(phone) => request_sms_code(surface, &phone, &self.timeouts).await,
			None => info!(target = "jobpilot", "no login phone configured, waiting for manual login"),
		}

		self.set_state(SessionState::AwaitingUserVerification);
		info!(
			target = "jobpilot",
			timeout_secs = self.login.timeout_secs,
			"waiting for user verification in the browser"
		);

		if !self.wait_for_verification().await {
			warn!(target = "jobpilot", timeout_secs = self.login.timeout_secs, "login verification timed out");
			self.set_state(SessionState::LoginFailed("timed out".to_string()));
			return Err(EngineError::LoginTimeout { secs: self.login.timeout_secs });
		}

		self.persist_cookies().await;
		info!(target = "jobpilot", "login succeeded");
		self.set_state(SessionState::LoggedIn);
		Ok(())
	}

	fn login_phone(&self) -> Option<String> {
		match self.user_config.load() {
			Ok(config) => config.login_phone().map(str::to_string),
			Err(err) => {
				warn!(target = "jobpilot", error = %err, "user config unreadable, skipping phone prefill");
				None
			}
		}
	}

	async fn wait_for_verification(&self) -> bool {
		let Ok(browser) = self.browser() else {
			return false;
		};
		let surface = browser.main_surface();
		let deadline = Instant::now() + self.login.timeout();

		loop {
			tokio::time::sleep(self.login.poll()).await;

			let url = surface.url().await.unwrap_or_default();
			if !url.is_empty() && !site::is_login_url(&url) {
				if probe::first_passing(probe::LOGIN_PROBES, surface).await.is_some() {
					return true;
				}
				debug!(target = "jobpilot", url = %url, "left login page but probes still negative");
			}
			if probe::first_passing(probe::VERIFICATION_PROBES, surface).await.is_some() {
				return true;
			}
			if Instant::now() >= deadline {
				return false;
			}
		}
	}

	async fn persist_cookies(&self) {
		let Ok(browser) = self.browser() else {
			return;
		};
		match browser.cookies().await {
			Ok(cookies) if !cookies.is_empty() => self.store.save(&SessionCredential::new(cookies)),
			Ok(_) => debug!(target = "jobpilot", "no cookies to persist"),
			Err(err) => warn!(target = "jobpilot", error = %err, "failed to read cookies"),
		}
	}

	/// Persists cookies and closes the browser. Safe to call repeatedly.
	pub async fn stop(&mut self) {
		if self.browser.is_some() {
			self.persist_cookies().await;
		}
		if let Some(mut browser) = self.browser.take() {
			if let Err(err) = browser.close().await {
				warn!(target = "jobpilot", error = %err, "browser did not close cleanly");
			}
		}
		self.set_state(SessionState::Stopped);
	}
}

fn login_outcome(result: Result<()>) -> Result<bool> {
	match result {
		Ok(()) => Ok(true),
		Err(EngineError::LoginTimeout { .. } | EngineError::LoginUnavailable) => Ok(false),
		Err(err) => Err(err),
	}
}

/// Best-effort SMS login form prefill; every step may fail independently.
async fn request_sms_code<S: Surface>(surface: &S, phone: &str, timeouts: &TimeoutSettings) {
	match site::SMS_TAB.first(surface).await {
		Some(tab) => {
			if let Err(err) = tab.click().await {
				debug!(target = "jobpilot", error = %err, "sms tab click failed");
			}
			tokio::time::sleep(timeouts.detail()).await;
		}
		None => debug!(target = "jobpilot", "sms tab not found"),
	}

	match site::PHONE_INPUT.first(surface).await {
		Some(input) => match input.fill(phone).await {
			Ok(()) => info!(target = "jobpilot", "phone number filled"),
			Err(err) => warn!(target = "jobpilot", error = %err, "failed to fill phone number"),
		},
		None => warn!(target = "jobpilot", "phone input not found"),
	}

	match site::SEND_CODE.first(surface).await {
		Some(button) => match button.click().await {
			Ok(()) => info!(target = "jobpilot", "verification code requested"),
			Err(err) => warn!(target = "jobpilot", error = %err, "failed to request verification code"),
		},
		None => warn!(target = "jobpilot", "send-code button not found"),
	}
}
