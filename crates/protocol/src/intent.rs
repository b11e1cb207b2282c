//! Job-search intent produced by intent resolution.

use serde::{Deserialize, Serialize};

use crate::user_config::UserConfig;

/// Whatever an intent resolver managed to extract; every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentHints {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub keyword: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub count: Option<u32>,
}

/// Fallback values used when neither the resolver nor the user config
/// supplies a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentDefaults {
	pub keyword: String,
	pub city: String,
	pub count: u32,
}

impl Default for IntentDefaults {
	fn default() -> Self {
		Self {
			keyword: "工作".to_string(),
			city: "北京".to_string(),
			count: 5,
		}
	}
}

/// Fully resolved parameters for one apply run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyIntent {
	pub keyword: String,
	pub city: String,
	pub count: u32,
}

impl IntentHints {
	/// Fills missing fields: resolver output first, then the user's
	/// configured role/city, then `defaults`. A count of zero counts as missing.
	pub fn complete(self, user: &UserConfig, defaults: &IntentDefaults) -> ApplyIntent {
		let keyword = present(self.keyword)
			.or_else(|| user.target_role().map(str::to_string))
			.unwrap_or_else(|| defaults.keyword.clone());
		let city = present(self.city)
			.or_else(|| user.target_city().map(str::to_string))
			.unwrap_or_else(|| defaults.city.clone());
		let count = self.count.filter(|&n| n > 0).unwrap_or(defaults.count.max(1));

		ApplyIntent { keyword, city, count }
	}
}

fn present(value: Option<String>) -> Option<String> {
	value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resolver_fields_win() {
		let hints = IntentHints {
			keyword: Some("产品经理".into()),
			city: Some("北京".into()),
			count: Some(3),
		};
		let user = UserConfig {
			target_role: Some("运营".into()),
			target_city: Some("上海".into()),
			..Default::default()
		};

		let intent = hints.complete(&user, &IntentDefaults::default());
		assert_eq!(intent.keyword, "产品经理");
		assert_eq!(intent.city, "北京");
		assert_eq!(intent.count, 3);
	}

	#[test]
	fn user_config_then_defaults_fill_gaps() {
		let user = UserConfig {
			target_city: Some("杭州".into()),
			..Default::default()
		};

		let intent = IntentHints {
			count: Some(0),
			keyword: Some(" ".into()),
			..Default::default()
		}
		.complete(&user, &IntentDefaults::default());

		assert_eq!(intent.keyword, "工作");
		assert_eq!(intent.city, "杭州");
		assert_eq!(intent.count, 5);
	}
}
