//! In-memory job site implementing the driver traits for unit tests.
//!
//! Pages are rendered from [`SiteState`] on every query, so clicks and
//! logins show up on the next read the same way they do on the real site.
//! Selector matching is exact string comparison against an element's tags.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobpilot_protocol::Cookie;
use jobpilot_runtime::{Browser, Error, LaunchOptions, Launcher, Node, Result, Scope, Surface};
use parking_lot::{Mutex, MutexGuard};

use crate::site;

pub(crate) const SESSION_COOKIE: &str = "wt2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
	OpenDetail(usize),
	Chat(usize),
	SmsTab,
	SendCode,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeElement {
	tags: Vec<String>,
	text: String,
	attrs: Vec<(String, String)>,
	action: Option<Action>,
	children: Vec<FakeElement>,
}

impl FakeElement {
	pub(crate) fn new(tag: &str) -> Self {
		Self {
			tags: vec![tag.to_string()],
			text: String::new(),
			attrs: Vec::new(),
			action: None,
			children: Vec::new(),
		}
	}

	pub(crate) fn tag(mut self, tag: &str) -> Self {
		self.tags.push(tag.to_string());
		self
	}

	pub(crate) fn text(mut self, text: &str) -> Self {
		self.text = text.to_string();
		self
	}

	pub(crate) fn attr(mut self, name: &str, value: &str) -> Self {
		self.attrs.push((name.to_string(), value.to_string()));
		self
	}

	pub(crate) fn action(mut self, action: Action) -> Self {
		self.action = Some(action);
		self
	}

	pub(crate) fn child(mut self, child: FakeElement) -> Self {
		self.children.push(child);
		self
	}

	fn full_text(&self) -> String {
		let mut parts = vec![self.text.clone()];
		parts.extend(self.children.iter().map(FakeElement::full_text));
		parts.retain(|part| !part.is_empty());
		parts.join("\n")
	}
}

fn matching(children: &[FakeElement], css: &str, out: &mut Vec<FakeElement>) {
	for child in children {
		if child.tags.iter().any(|tag| tag == css) {
			out.push(child.clone());
		}
		matching(&child.children, css, out);
	}
}

/// One job card on the results page.
#[derive(Debug, Clone)]
pub(crate) struct Listing {
	pub title: Option<String>,
	pub company: Option<String>,
	pub salary: Option<String>,
	pub chat_label: Option<String>,
	pub stale_chat: bool,
	pub linked: bool,
}

impl Listing {
	pub(crate) fn new(title: &str) -> Self {
		Self {
			title: Some(title.to_string()),
			company: Some("示例科技".to_string()),
			salary: Some("20-30K".to_string()),
			chat_label: Some("立即沟通".to_string()),
			stale_chat: false,
			linked: true,
		}
	}

	pub(crate) fn contacted(mut self) -> Self {
		self.chat_label = Some("继续沟通".to_string());
		self
	}

	pub(crate) fn stale(mut self) -> Self {
		self.stale_chat = true;
		self
	}

	pub(crate) fn without_control(mut self) -> Self {
		self.chat_label = None;
		self
	}

	pub(crate) fn unlinked(mut self) -> Self {
		self.linked = false;
		self
	}

	pub(crate) fn anonymous(mut self) -> Self {
		self.title = None;
		self.company = None;
		self.salary = None;
		self
	}
}

fn detail_url(index: usize) -> String {
	format!("{}/job_detail/{index}.html", site::BASE_URL)
}

#[derive(Debug, Default)]
pub(crate) struct SiteState {
	pub logged_in: bool,
	/// The user finishes verification after this many URL reads on the login page.
	pub verify_after_polls: Option<usize>,
	pub polls: usize,
	pub listings: Vec<Listing>,
	pub login_page_down: bool,
	pub disconnected: bool,
	pub fail_launch: bool,
	pub failing_queries: bool,
	pub static_page: Option<(Vec<FakeElement>, String)>,
	pub applied: Vec<usize>,
	pub sms_tab_clicked: bool,
	pub phone_filled: Option<String>,
	pub code_sent: bool,
	pub popup: Option<String>,
	pub open_extra: Vec<usize>,
	pub next_surface: usize,
	pub gotos: Vec<String>,
	pub launches: usize,
	pub closed_browsers: usize,
	pub last_launch: Option<LaunchOptions>,
	pub restored_cookies: Vec<Cookie>,
}

impl SiteState {
	fn render(&self, url: &str) -> (Vec<FakeElement>, String) {
		if let Some(page) = &self.static_page {
			return page.clone();
		}
		if site::is_login_url(url) {
			return (
				vec![
					FakeElement::new("[ka=\"smslogin\"]").text("短信登录").action(Action::SmsTab),
					FakeElement::new("input[name=\"phone\"]"),
					FakeElement::new("button").text("获取验证码").action(Action::SendCode),
				],
				"短信登录 获取验证码".to_string(),
			);
		}
		if url.contains(site::JOB_PATH) {
			if !self.logged_in {
				return (Vec::new(), "登录后查看更多职位".to_string());
			}
			let mut children = vec![FakeElement::new(".user-nav img")];
			children.extend(self.listings.iter().enumerate().map(|(index, listing)| card(index, listing)));
			return (children, "职位列表".to_string());
		}
		if let Some(index) = url.strip_prefix(&format!("{}/job_detail/", site::BASE_URL)).and_then(|rest| rest.strip_suffix(".html")).and_then(|n| n.parse::<usize>().ok()) {
			let Some(listing) = self.listings.get(index) else {
				return (Vec::new(), String::new());
			};
			let children = listing
				.chat_label
				.as_deref()
				.map(|label| vec![FakeElement::new(".btn-startchat").tag("button").text(label).action(Action::Chat(index))])
				.unwrap_or_default();
			return (children, listing.title.clone().unwrap_or_default());
		}
		(Vec::new(), String::new())
	}
}

fn card(index: usize, listing: &Listing) -> FakeElement {
	let mut card = FakeElement::new("li.job-card-box").action(Action::OpenDetail(index));
	if let Some(title) = &listing.title {
		card = card.child(FakeElement::new(".job-name").text(title));
	}
	if let Some(company) = &listing.company {
		card = card.child(FakeElement::new(".company-name").text(company));
	}
	if let Some(salary) = &listing.salary {
		card = card.child(FakeElement::new(".salary").text(salary));
	}
	if listing.linked {
		card = card.child(FakeElement::new("a[href*=\"job_detail\"]").attr("href", &format!("/job_detail/{index}.html")));
	}
	card
}

/// Handle to the shared site state.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeSite(Arc<Mutex<SiteState>>);

impl FakeSite {
	pub(crate) fn state(&self) -> MutexGuard<'_, SiteState> {
		self.0.lock()
	}

	pub(crate) fn logged_in(self) -> Self {
		self.state().logged_in = true;
		self
	}

	pub(crate) fn verify_after(self, polls: usize) -> Self {
		self.state().verify_after_polls = Some(polls);
		self
	}

	pub(crate) fn listings(self, listings: Vec<Listing>) -> Self {
		self.state().listings = listings;
		self
	}

	pub(crate) fn launcher(&self) -> FakeLauncher {
		FakeLauncher { site: self.clone() }
	}

	fn surface(&self, url: &str) -> FakeSurface {
		let id = {
			let mut state = self.state();
			state.next_surface += 1;
			state.next_surface
		};
		FakeSurface {
			site: self.clone(),
			id,
			url: Arc::new(Mutex::new(url.to_string())),
		}
	}
}

pub(crate) struct FakeSurface {
	site: FakeSite,
	id: usize,
	url: Arc<Mutex<String>>,
}

impl FakeSurface {
	/// A standalone surface showing fixed content.
	pub(crate) fn with_children(children: Vec<FakeElement>) -> Self {
		let site = FakeSite::default();
		site.state().static_page = Some((children, String::new()));
		site.surface("about:blank")
	}

	pub(crate) fn body_text(self, text: &str) -> Self {
		if let Some(page) = self.site.state().static_page.as_mut() {
			page.1 = text.to_string();
		}
		self
	}

	pub(crate) fn at(self, url: &str) -> Self {
		*self.url.lock() = url.to_string();
		self
	}

	pub(crate) fn failing_queries(self) -> Self {
		self.site.state().failing_queries = true;
		self
	}

	fn render(&self) -> Result<(Vec<FakeElement>, String)> {
		let state = self.site.state();
		if state.failing_queries {
			return Err(Error::Cdp("query failed".into()));
		}
		if state.disconnected {
			return Err(Error::Disconnected("browser gone".into()));
		}
		Ok(state.render(&self.url.lock()))
	}
}

#[async_trait]
impl Scope for FakeSurface {
	type Node = FakeNode;

	async fn query_all(&self, css: &str) -> Result<Vec<FakeNode>> {
		let (children, _) = self.render()?;
		let mut found = Vec::new();
		matching(&children, css, &mut found);
		Ok(found.into_iter().map(|element| FakeNode { element, site: self.site.clone() }).collect())
	}

	async fn text(&self) -> Result<String> {
		let (children, body) = self.render()?;
		let mut parts = vec![body];
		parts.extend(children.iter().map(FakeElement::full_text));
		Ok(parts.join("\n"))
	}
}

#[async_trait]
impl Surface for FakeSurface {
	async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
		let mut state = self.site.state();
		state.gotos.push(url.to_string());
		if state.disconnected {
			return Err(Error::Disconnected("browser gone".into()));
		}
		if state.login_page_down && site::is_login_url(url) {
			return Err(Error::Navigation {
				url: url.to_string(),
				source: Box::new(Error::timeout("page load", timeout)),
			});
		}
		*self.url.lock() = url.to_string();
		Ok(())
	}

	async fn url(&self) -> Result<String> {
		let mut state = self.site.state();
		let mut url = self.url.lock();
		if site::is_login_url(&url) && !state.logged_in {
			if let Some(after) = state.verify_after_polls {
				state.polls += 1;
				if state.polls >= after {
					state.logged_in = true;
					*url = site::job_home_url();
				}
			}
		}
		Ok(url.clone())
	}

	async fn close(self) -> Result<()> {
		self.site.state().open_extra.retain(|id| *id != self.id);
		Ok(())
	}
}

pub(crate) struct FakeNode {
	element: FakeElement,
	site: FakeSite,
}

#[async_trait]
impl Scope for FakeNode {
	type Node = FakeNode;

	async fn query_all(&self, css: &str) -> Result<Vec<FakeNode>> {
		let mut found = Vec::new();
		matching(&self.element.children, css, &mut found);
		Ok(found.into_iter().map(|element| FakeNode { element, site: self.site.clone() }).collect())
	}

	async fn text(&self) -> Result<String> {
		Ok(self.element.full_text())
	}
}

#[async_trait]
impl Node for FakeNode {
	async fn attribute(&self, name: &str) -> Result<Option<String>> {
		Ok(self.element.attrs.iter().find(|(key, _)| key == name).map(|(_, value)| value.clone()))
	}

	async fn click(&self) -> Result<()> {
		let mut state = self.site.state();
		if state.disconnected {
			return Err(Error::Disconnected("browser gone".into()));
		}
		match &self.element.action {
			Some(Action::Chat(index)) => {
				if state.listings.get(*index).is_some_and(|listing| listing.stale_chat) {
					return Err(Error::Detached("node is detached from document".into()));
				}
				state.applied.push(*index);
			}
			Some(Action::OpenDetail(index)) => state.popup = Some(detail_url(*index)),
			Some(Action::SmsTab) => state.sms_tab_clicked = true,
			Some(Action::SendCode) => state.code_sent = true,
			None => {}
		}
		Ok(())
	}

	async fn fill(&self, value: &str) -> Result<()> {
		self.site.state().phone_filled = Some(value.to_string());
		Ok(())
	}
}

pub(crate) struct FakeBrowser {
	site: FakeSite,
	main: FakeSurface,
}

impl FakeBrowser {
	fn open(&self, url: &str) -> FakeSurface {
		let surface = self.site.surface(url);
		self.site.state().open_extra.push(surface.id);
		surface
	}
}

#[async_trait]
impl Browser for FakeBrowser {
	type Surface = FakeSurface;

	fn main_surface(&self) -> &FakeSurface {
		&self.main
	}

	async fn open_linked(&self, _from: &FakeSurface, node: &FakeNode, timeout: Duration) -> Result<FakeSurface> {
		if let Some(href) = node.attribute("href").await? {
			let url = if href.starts_with('/') { format!("{}{href}", site::BASE_URL) } else { href };
			return Ok(self.open(&url));
		}
		node.click().await?;
		let popup = self.site.state().popup.take();
		match popup {
			Some(url) => Ok(self.open(&url)),
			None => Err(Error::timeout("new surface after click", timeout)),
		}
	}

	async fn close_extra_surfaces(&self) -> Result<usize> {
		let mut state = self.site.state();
		let closed = state.open_extra.len();
		state.open_extra.clear();
		Ok(closed)
	}

	async fn cookies(&self) -> Result<Vec<Cookie>> {
		let state = self.site.state();
		if state.disconnected {
			return Err(Error::Disconnected("browser gone".into()));
		}
		Ok(if state.logged_in { vec![Cookie::new(SESSION_COOKIE, "token", ".zhipin.com")] } else { Vec::new() })
	}

	async fn set_cookies(&self, cookies: &[Cookie]) -> Result<()> {
		let mut state = self.site.state();
		state.restored_cookies = cookies.to_vec();
		if cookies.iter().any(|cookie| cookie.name == SESSION_COOKIE) {
			state.logged_in = true;
		}
		Ok(())
	}

	async fn close(&mut self) -> Result<()> {
		self.site.state().closed_browsers += 1;
		Ok(())
	}
}

pub(crate) struct FakeLauncher {
	site: FakeSite,
}

#[async_trait]
impl Launcher for FakeLauncher {
	type Browser = FakeBrowser;

	async fn launch(&self, options: &LaunchOptions) -> Result<FakeBrowser> {
		{
			let mut state = self.site.state();
			state.launches += 1;
			state.last_launch = Some(options.clone());
			if state.fail_launch {
				return Err(Error::Launch("no browser binary".into()));
			}
			state.disconnected = false;
			state.static_page = None;
		}
		Ok(FakeBrowser {
			main: self.site.surface("about:blank"),
			site: self.site.clone(),
		})
	}
}
