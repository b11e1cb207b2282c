//! Chromium backend over the DevTools protocol (`chromiumoxide`).

mod cookies;

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::element::Element;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use jobpilot_protocol::Cookie;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

use crate::driver::{Browser, Launcher, Node, Scope, Surface};
use crate::error::{Error, Result};
use crate::launch::{LaunchOptions, STEALTH_SCRIPT};

const BODY_TEXT_JS: &str = "document.body ? document.body.innerText : ''";

const CLEAR_VALUE_JS: &str = "function() { if ('value' in this) { this.value = ''; } }";

const NEW_SURFACE_POLL: Duration = Duration::from_millis(200);

/// Launches a local Chromium/Chrome process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

#[async_trait]
impl Launcher for ChromiumLauncher {
	type Browser = ChromiumBrowser;

	async fn launch(&self, options: &LaunchOptions) -> Result<ChromiumBrowser> {
		let mut builder = BrowserConfig::builder()
			.window_size(options.window_width, options.window_height)
			.viewport(Viewport {
				width: options.window_width,
				height: options.window_height,
				..Default::default()
			})
			.args(options.args());
		if !options.headless {
			builder = builder.with_head();
		}
		if let Some(executable) = &options.executable {
			builder = builder.chrome_executable(executable);
		}
		let config = builder.build().map_err(Error::Launch)?;

		let (browser, mut handler) = CdpBrowser::launch(config).await.map_err(|err| Error::Launch(err.to_string()))?;
		let handler_task = tokio::spawn(async move {
			while let Some(event) = handler.next().await {
				if let Err(err) = event {
					debug!(target = "jobpilot", error = %err, "cdp handler event failed");
				}
			}
		});

		let page = match browser.new_page("about:blank").await {
			Ok(page) => page,
			Err(err) => {
				handler_task.abort();
				return Err(Error::Launch(err.to_string()));
			}
		};
		install_stealth(&page).await?;

		info!(target = "jobpilot", headless = options.headless, "browser launched");
		Ok(ChromiumBrowser {
			browser,
			handler_task,
			main: ChromiumSurface { page },
			closed: false,
		})
	}
}

async fn install_stealth(page: &Page) -> Result<()> {
	page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT)).await?;
	Ok(())
}

fn target_id(page: &Page) -> String {
	let id: &str = page.target_id().as_ref();
	id.to_string()
}

/// A running Chromium process plus its main tab.
pub struct ChromiumBrowser {
	browser: CdpBrowser,
	handler_task: JoinHandle<()>,
	main: ChromiumSurface,
	closed: bool,
}

impl ChromiumBrowser {
	async fn surface_ids(&self) -> Result<HashSet<String>> {
		Ok(self.browser.pages().await?.iter().map(target_id).collect())
	}

	async fn new_surface(&self, url: &str, timeout: Duration) -> Result<ChromiumSurface> {
		let page = self.browser.new_page("about:blank").await?;
		install_stealth(&page).await?;
		let surface = ChromiumSurface { page };
		surface.goto(url, timeout).await?;
		Ok(surface)
	}

	async fn capture_new_surface(&self, before: &HashSet<String>, timeout: Duration) -> Result<ChromiumSurface> {
		let deadline = tokio::time::Instant::now() + timeout;
		loop {
			let pages = self.browser.pages().await?;
			if let Some(page) = pages.into_iter().find(|page| !before.contains(&target_id(page))) {
				return Ok(ChromiumSurface { page });
			}
			if tokio::time::Instant::now() >= deadline {
				return Err(Error::timeout("new surface after click", timeout));
			}
			tokio::time::sleep(NEW_SURFACE_POLL).await;
		}
	}
}

#[async_trait]
impl Browser for ChromiumBrowser {
	type Surface = ChromiumSurface;

	fn main_surface(&self) -> &ChromiumSurface {
		&self.main
	}

	async fn open_linked(&self, from: &ChromiumSurface, node: &ChromiumNode, timeout: Duration) -> Result<ChromiumSurface> {
		let href = node.attribute("href").await?.filter(|href| {
			let href = href.trim();
			!href.is_empty() && href != "#" && !href.starts_with("javascript:")
		});

		if let Some(href) = href {
			let base = from.url().await?;
			let target = resolve_href(&base, &href)?;
			return self.new_surface(&target, timeout).await;
		}

		let before = self.surface_ids().await?;
		node.click().await?;
		self.capture_new_surface(&before, timeout).await
	}

	async fn close_extra_surfaces(&self) -> Result<usize> {
		let main_id = target_id(&self.main.page);
		let mut closed = 0;
		for page in self.browser.pages().await? {
			if target_id(&page) != main_id {
				page.close().await?;
				closed += 1;
			}
		}
		Ok(closed)
	}

	async fn cookies(&self) -> Result<Vec<Cookie>> {
		let cookies = self.main.page.get_cookies().await?;
		Ok(cookies.into_iter().map(cookies::from_cdp).collect())
	}

	async fn set_cookies(&self, cookies: &[Cookie]) -> Result<()> {
		let params: Vec<_> = cookies.iter().filter_map(cookies::to_param).collect();
		if params.len() < cookies.len() {
			debug!(target = "jobpilot", skipped = cookies.len() - params.len(), "cookies without domain skipped");
		}
		if !params.is_empty() {
			self.main.page.set_cookies(params).await?;
		}
		Ok(())
	}

	async fn close(&mut self) -> Result<()> {
		if self.closed {
			return Ok(());
		}
		self.closed = true;
		let result = self.browser.close().await;
		let _ = self.browser.wait().await;
		self.handler_task.abort();
		result?;
		info!(target = "jobpilot", "browser closed");
		Ok(())
	}
}

fn resolve_href(base: &str, href: &str) -> Result<String> {
	if let Ok(url) = Url::parse(href) {
		return Ok(url.into());
	}
	let base = Url::parse(base).map_err(|err| Error::InvalidUrl {
		url: base.to_string(),
		reason: err.to_string(),
	})?;
	base.join(href).map(Into::into).map_err(|err| Error::InvalidUrl {
		url: href.to_string(),
		reason: err.to_string(),
	})
}

/// One Chromium tab.
#[derive(Clone)]
pub struct ChromiumSurface {
	page: Page,
}

#[async_trait]
impl Scope for ChromiumSurface {
	type Node = ChromiumNode;

	async fn query_all(&self, css: &str) -> Result<Vec<ChromiumNode>> {
		let elements = self.page.find_elements(css).await?;
		Ok(elements.into_iter().map(|element| ChromiumNode { element }).collect())
	}

	async fn text(&self) -> Result<String> {
		let value = self.page.evaluate(BODY_TEXT_JS).await?;
		value.into_value::<String>().map_err(|err| Error::Cdp(err.to_string()))
	}
}

#[async_trait]
impl Surface for ChromiumSurface {
	async fn goto(&self, url: &str, timeout: Duration) -> Result<()> {
		match tokio::time::timeout(timeout, self.page.goto(url)).await {
			Ok(Ok(_)) => Ok(()),
			Ok(Err(err)) => Err(Error::Navigation {
				url: url.to_string(),
				source: Box::new(err.into()),
			}),
			Err(_) => Err(Error::Navigation {
				url: url.to_string(),
				source: Box::new(Error::timeout("page load", timeout)),
			}),
		}
	}

	async fn url(&self) -> Result<String> {
		Ok(self.page.url().await?.unwrap_or_default())
	}

	async fn close(self) -> Result<()> {
		self.page.close().await?;
		Ok(())
	}
}

/// Handle to one DOM element.
pub struct ChromiumNode {
	element: Element,
}

#[async_trait]
impl Scope for ChromiumNode {
	type Node = ChromiumNode;

	async fn query_all(&self, css: &str) -> Result<Vec<ChromiumNode>> {
		let elements = self.element.find_elements(css).await?;
		Ok(elements.into_iter().map(|element| ChromiumNode { element }).collect())
	}

	async fn text(&self) -> Result<String> {
		Ok(self.element.inner_text().await?.unwrap_or_default())
	}
}

#[async_trait]
impl Node for ChromiumNode {
	async fn attribute(&self, name: &str) -> Result<Option<String>> {
		Ok(self.element.attribute(name).await?)
	}

	async fn click(&self) -> Result<()> {
		self.element.click().await?;
		Ok(())
	}

	async fn fill(&self, value: &str) -> Result<()> {
		self.element.call_js_fn(CLEAR_VALUE_JS, false).await?;
		self.element.click().await?;
		self.element.type_str(value).await?;
		Ok(())
	}
}
