//! Error types for the browser runtime.

use std::time::Duration;

use chromiumoxide::error::CdpError;
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while driving the browser.
#[derive(Debug, Error)]
pub enum Error {
	/// The browser process could not be started.
	#[error("browser launch failed: {0}")]
	Launch(String),

	/// Navigation to `url` failed.
	#[error("navigation failed: {url}")]
	Navigation {
		url: String,
		#[source]
		source: Box<Error>,
	},

	#[error("timeout after {}ms waiting for: {what}", after.as_millis())]
	Timeout { what: String, after: Duration },

	/// The element handle no longer points into the live document.
	#[error("element detached: {0}")]
	Detached(String),

	/// The connection to the browser process is gone.
	#[error("browser disconnected: {0}")]
	Disconnected(String),

	#[error("invalid url '{url}': {reason}")]
	InvalidUrl { url: String, reason: String },

	/// Any other DevTools protocol failure.
	#[error("cdp error: {0}")]
	Cdp(String),
}

impl Error {
	pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
		Error::Timeout { what: what.into(), after }
	}

	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		match self {
			Error::Timeout { .. } => true,
			Error::Navigation { source, .. } => source.is_timeout(),
			_ => false,
		}
	}

	/// Returns true when the browser itself is unusable and should be relaunched.
	pub fn is_browser_level(&self) -> bool {
		match self {
			Error::Launch(_) | Error::Disconnected(_) => true,
			Error::Navigation { source, .. } => source.is_browser_level(),
			_ => false,
		}
	}
}

const DETACHED_MARKERS: &[&str] = &[
	"detached",
	"No node with given id",
	"Could not find node",
	"Cannot find context with specified id",
	"Node is not an element",
];

impl From<CdpError> for Error {
	fn from(err: CdpError) -> Self {
		match err {
			CdpError::Timeout => Error::Cdp("request timed out".to_string()),
			CdpError::Ws(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => Error::Disconnected(err.to_string()),
			other => {
				let message = other.to_string();
				if DETACHED_MARKERS.iter().any(|marker| message.contains(marker)) {
					Error::Detached(message)
				} else {
					Error::Cdp(message)
				}
			}
		}
	}
}
