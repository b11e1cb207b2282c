//! Table-driven intent extraction.

use std::sync::LazyLock;

use async_trait::async_trait;
use jobpilot_protocol::IntentHints;
use regex::Regex;

use super::IntentResolver;
use crate::error::Result;
use crate::site;

/// Role keywords recognized in free text, matched longest first.
const ROLES: &[&str] = &[
	"产品经理",
	"项目经理",
	"数据分析师",
	"数据分析",
	"数据挖掘",
	"算法工程师",
	"前端开发",
	"后端开发",
	"全栈开发",
	"测试工程师",
	"运维工程师",
	"Java开发",
	"Python开发",
	"Go开发",
	"Rust开发",
	"C++开发",
	"Android开发",
	"iOS开发",
	"软件工程师",
	"UI设计师",
	"UI设计",
	"交互设计",
	"新媒体运营",
	"产品运营",
	"用户运营",
	"运营",
	"市场营销",
	"销售",
	"人力资源",
	"HR",
	"财务",
	"会计",
	"行政",
	"Java",
	"Python",
	"Golang",
	"Rust",
	"前端",
	"后端",
];

static COUNT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(\d+|[一二两三四五六七八九十]+)\s*(?:个|份|家)").unwrap());

/// Resolves intent from the site's city table, a role vocabulary and
/// "N个…岗位" counts (Arabic or Chinese numerals).
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupResolver;

impl LookupResolver {
	pub fn extract(text: &str) -> IntentHints {
		IntentHints {
			keyword: find_role(text).map(str::to_string),
			city: site::known_cities().find(|city| text.contains(city)).map(str::to_string),
			count: find_count(text),
		}
	}
}

#[async_trait]
impl IntentResolver for LookupResolver {
	async fn resolve(&self, text: &str) -> Result<IntentHints> {
		Ok(Self::extract(text))
	}
}

fn find_role(text: &str) -> Option<&'static str> {
	let lowered = text.to_lowercase();
	ROLES
		.iter()
		.filter(|role| lowered.contains(&role.to_lowercase()))
		.max_by_key(|role| role.chars().count())
		.copied()
}

fn find_count(text: &str) -> Option<u32> {
	let captures = COUNT.captures(text)?;
	let raw = captures.get(1)?.as_str();
	raw.parse().ok().or_else(|| chinese_number(raw)).filter(|n| *n > 0)
}

fn digit(c: char) -> Option<u32> {
	Some(match c {
		'一' => 1,
		'二' | '两' => 2,
		'三' => 3,
		'四' => 4,
		'五' => 5,
		'六' => 6,
		'七' => 7,
		'八' => 8,
		'九' => 9,
		_ => return None,
	})
}

/// Parses Chinese numerals up to 99 (`十`, `十五`, `二十`, `三十七`).
fn chinese_number(raw: &str) -> Option<u32> {
	match raw.split_once('十') {
		None => {
			let mut chars = raw.chars();
			let value = digit(chars.next()?)?;
			chars.next().is_none().then_some(value)
		}
		Some((tens, ones)) => {
			let tens = if tens.is_empty() { 1 } else { chinese_number(tens)? };
			let ones = if ones.is_empty() { 0 } else { chinese_number(ones)? };
			(tens < 10 && ones < 10).then_some(tens * 10 + ones)
		}
	}
}
