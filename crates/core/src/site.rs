//! Catalog for the BOSS Zhipin job site: URLs, region codes and the
//! selector chains for every element the engine touches.

use url::Url;

use crate::error::{EngineError, Result};
use crate::selectors::{Candidate, SelectorChain};

pub const BASE_URL: &str = "https://www.zhipin.com";

/// Job search page; only shows results to a logged-in user.
pub const JOB_PATH: &str = "/web/geek/job";

pub const LOGIN_PATH: &str = "/web/user/";

pub const DEFAULT_REGION: &str = "101010100";

const REGIONS: &[(&str, &str)] = &[
	("北京", "101010100"),
	("上海", "101020100"),
	("广州", "101280100"),
	("深圳", "101280600"),
	("杭州", "101210100"),
	("成都", "101270100"),
	("武汉", "101200100"),
	("南京", "101190100"),
	("西安", "101110100"),
	("苏州", "101190400"),
];

/// Cities with a known region code.
pub fn known_cities() -> impl Iterator<Item = &'static str> {
	REGIONS.iter().map(|(city, _)| *city)
}

/// Region code for `city`; unknown cities map to Beijing.
pub fn region_code(city: &str) -> &'static str {
	let city = city.trim();
	REGIONS
		.iter()
		.find(|(name, _)| city == *name || city.strip_suffix('市') == Some(*name))
		.map(|(_, code)| *code)
		.unwrap_or(DEFAULT_REGION)
}

pub fn job_home_url() -> String {
	format!("{BASE_URL}{JOB_PATH}")
}

pub fn login_url() -> String {
	format!("{BASE_URL}{LOGIN_PATH}?ka=header-login")
}

pub fn search_url(keyword: &str, city: &str) -> Result<String> {
	let url = Url::parse_with_params(&job_home_url(), &[("query", keyword), ("city", region_code(city))])
		.map_err(|err| EngineError::Anyhow(anyhow::anyhow!("search url: {err}")))?;
	Ok(url.into())
}

pub fn is_login_url(url: &str) -> bool {
	url.contains(LOGIN_PATH)
}

/// Chat-button labels meaning the user already contacted this recruiter.
pub const EXISTING_CONVERSATION: &[&str] = &["继续沟通", "已沟通"];

pub const RESULTS: SelectorChain = SelectorChain::new("results", &[Candidate::Css("li.job-card-box"), Candidate::Css(".job-card-wrapper")]);

pub const CARD_TITLE: SelectorChain = SelectorChain::new("card title", &[Candidate::Css(".job-name"), Candidate::Css(".job-title")]);

pub const CARD_COMPANY: SelectorChain =
	SelectorChain::new("card company", &[Candidate::Css(".company-name"), Candidate::Css(".info-company")]);

pub const CARD_SALARY: SelectorChain = SelectorChain::new("card salary", &[Candidate::Css(".salary"), Candidate::Css(".job-salary")]);

pub const CARD_LINK: SelectorChain = SelectorChain::new("card link", &[Candidate::Css("a[href*=\"job_detail\"]")]);

pub const CHAT_BUTTON: SelectorChain = SelectorChain::new(
	"chat button",
	&[
		Candidate::Css(".btn-startchat"),
		Candidate::Css(".op-btn-chat"),
		Candidate::CssWithText { css: "button", text: &["立即沟通"] },
	],
);

pub const AVATAR: SelectorChain = SelectorChain::new(
	"avatar",
	&[Candidate::Css(".user-nav img"), Candidate::Css(".nav-figure img"), Candidate::Css(".user-info")],
);

pub const ACCOUNT_NAV: SelectorChain =
	SelectorChain::new("account nav", &[Candidate::CssWithText { css: "a", text: &["我的"] }, Candidate::Css(".user-nav")]);

pub const LOGIN_PROMPT: SelectorChain = SelectorChain::new("login prompt", &[Candidate::Text(&["登录后查看", "请登录"])]);

pub const SMS_TAB: SelectorChain = SelectorChain::new(
	"sms tab",
	&[
		Candidate::Css("[ka=\"smslogin\"]"),
		Candidate::Css(".sms-login"),
		Candidate::CssWithText { css: "a, span, div", text: &["短信登录"] },
	],
);

pub const PHONE_INPUT: SelectorChain = SelectorChain::new(
	"phone input",
	&[
		Candidate::Css("input[name=\"phone\"]"),
		Candidate::Css("input[placeholder*=\"手机\"]"),
		Candidate::Css("input[type=\"tel\"]"),
	],
);

pub const SEND_CODE: SelectorChain = SelectorChain::new(
	"send code",
	&[
		Candidate::CssWithText { css: "button", text: &["发送", "获取验证码"] },
		Candidate::Css(".btn-sms"),
	],
);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn region_lookup() {
		assert_eq!(region_code("上海"), "101020100");
		assert_eq!(region_code("苏州市"), "101190400");
		assert_eq!(region_code("拉萨"), DEFAULT_REGION);
		assert_eq!(known_cities().count(), 10);
	}

	#[test]
	fn search_url_is_encoded() {
		let url = search_url("产品经理", "深圳").unwrap();
		assert!(url.starts_with("https://www.zhipin.com/web/geek/job?query=%E4%BA%A7"));
		assert!(url.ends_with("&city=101280600"));
	}

	#[test]
	fn login_route_detection() {
		assert!(is_login_url(&login_url()));
		assert!(!is_login_url(&job_home_url()));
	}
}
