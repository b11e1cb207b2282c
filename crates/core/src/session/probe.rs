//! Layered login-state detection.
//!
//! A [`LoginProbe`] passes when all of its [`Check`]s hold on the current
//! surface. The session is considered logged in when any probe passes.

use jobpilot_runtime::Surface;
use tracing::debug;

use crate::selectors::SelectorChain;
use crate::site;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
	Present(SelectorChain),
	Absent(SelectorChain),
	UrlContains(&'static str),
	UrlLacks(&'static str),
}

impl Check {
	async fn holds<S: Surface>(&self, surface: &S, url: Option<&str>) -> bool {
		match self {
			Check::Present(chain) => chain.present(surface).await,
			Check::Absent(chain) => !chain.present(surface).await,
			Check::UrlContains(part) => url.is_some_and(|url| url.contains(part)),
			Check::UrlLacks(part) => url.is_some_and(|url| !url.contains(part)),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginProbe {
	pub name: &'static str,
	pub checks: &'static [Check],
}

impl LoginProbe {
	pub async fn passes<S: Surface>(&self, surface: &S) -> bool {
		let url = match surface.url().await {
			Ok(url) => Some(url),
			Err(err) => {
				debug!(target = "jobpilot", probe = self.name, error = %err, "url unavailable for probe");
				None
			}
		};
		for check in self.checks {
			if !check.holds(surface, url.as_deref()).await {
				return false;
			}
		}
		true
	}
}

/// Returns the name of the first passing probe.
pub async fn first_passing<S: Surface>(probes: &[LoginProbe], surface: &S) -> Option<&'static str> {
	for probe in probes {
		if probe.passes(surface).await {
			return Some(probe.name);
		}
	}
	None
}

pub const AVATAR_PROBE: LoginProbe = LoginProbe {
	name: "avatar",
	checks: &[Check::Present(site::AVATAR)],
};

pub const ACCOUNT_PROBE: LoginProbe = LoginProbe {
	name: "account",
	checks: &[Check::Present(site::ACCOUNT_NAV)],
};

pub const RESULTS_PROBE: LoginProbe = LoginProbe {
	name: "results",
	checks: &[
		Check::UrlContains(site::JOB_PATH),
		Check::UrlLacks(site::LOGIN_PATH),
		Check::Absent(site::LOGIN_PROMPT),
		Check::Present(site::RESULTS),
	],
};

/// Full probe set, strongest signal first.
pub const LOGIN_PROBES: &[LoginProbe] = &[AVATAR_PROBE, ACCOUNT_PROBE, RESULTS_PROBE];

/// Probes cheap enough to run on every verification poll.
pub const VERIFICATION_PROBES: &[LoginProbe] = &[AVATAR_PROBE, ACCOUNT_PROBE];
