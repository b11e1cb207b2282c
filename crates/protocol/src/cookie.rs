//! Cookie types for the persisted session credential.
//!
//! The on-disk shape is the browser-cookie JSON array that automation
//! drivers export (`name`, `value`, `domain`, `path`, `expires`, `httpOnly`,
//! `secure`, `sameSite`), so an existing `cookies.json` keeps working.

use serde::{Deserialize, Serialize};

/// SameSite cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
	#[serde(rename = "None")]
	None,
	#[default]
	#[serde(rename = "Lax")]
	Lax,
	#[serde(rename = "Strict")]
	Strict,
}

/// A browser cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	pub name: String,
	pub value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	/// Unix timestamp in seconds (-1 means session cookie)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub http_only: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secure: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub same_site: Option<SameSite>,
}

impl Cookie {
	/// Creates a cookie scoped to `domain`.
	pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			domain: Some(domain.into()),
			path: Some("/".to_string()),
			expires: None,
			http_only: None,
			secure: None,
			same_site: None,
		}
	}

	/// Returns true for cookies without a positive expiry timestamp.
	pub fn is_session(&self) -> bool {
		self.expires.is_none_or(|ts| ts < 0.0)
	}
}

/// The saved authentication state for the automated site.
///
/// Serialized as a bare cookie array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCredential {
	pub cookies: Vec<Cookie>,
}

impl SessionCredential {
	pub fn new(cookies: Vec<Cookie>) -> Self {
		Self { cookies }
	}

	pub fn is_empty(&self) -> bool {
		self.cookies.is_empty()
	}

	pub fn len(&self) -> usize {
		self.cookies.len()
	}
}
