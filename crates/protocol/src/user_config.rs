//! The user configuration record (`user_config.json`).
//!
//! Written by the external API; the engine only reads it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_city: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_role: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub salary: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub boss_phone: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub boss_account: Option<String>,
}

impl UserConfig {
	/// Phone number used to pre-fill the SMS login form.
	pub fn login_phone(&self) -> Option<&str> {
		non_blank(self.boss_phone.as_deref()).or_else(|| non_blank(self.boss_account.as_deref()))
	}

	pub fn target_city(&self) -> Option<&str> {
		non_blank(self.target_city.as_deref())
	}

	pub fn target_role(&self) -> Option<&str> {
		non_blank(self.target_role.as_deref())
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|v| !v.is_empty())
}
