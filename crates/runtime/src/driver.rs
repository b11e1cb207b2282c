//! Browser driver traits.
//!
//! The engine talks to the browser only through these traits. A
//! [`Launcher`] starts one [`Browser`] process; the browser owns a main
//! [`Surface`] (tab) and can open further surfaces for linked pages. Both
//! surfaces and element [`Node`]s are [`Scope`]s that can be queried with
//! CSS selectors.

use std::time::Duration;

use async_trait::async_trait;
use jobpilot_protocol::Cookie;

use crate::error::Result;
use crate::launch::LaunchOptions;

/// Something CSS selectors can be evaluated against.
#[async_trait]
pub trait Scope: Send + Sync {
	type Node: Node;

	/// All elements under this scope matching `css`, in document order.
	async fn query_all(&self, css: &str) -> Result<Vec<Self::Node>>;

	/// Rendered text of this scope (`innerText`).
	async fn text(&self) -> Result<String>;
}

/// A handle to one element. Handles may go stale when the page re-renders.
#[async_trait]
pub trait Node: Scope<Node = Self> + Sized + 'static {
	async fn attribute(&self, name: &str) -> Result<Option<String>>;

	async fn click(&self) -> Result<()>;

	/// Clears the element's current value and types `value`.
	async fn fill(&self, value: &str) -> Result<()>;
}

/// A browsing surface (tab).
#[async_trait]
pub trait Surface: Scope + Sized + 'static {
	async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

	async fn url(&self) -> Result<String>;

	async fn close(self) -> Result<()>;
}

/// Element type reachable from a browser's surfaces.
pub type NodeOf<B> = <<B as Browser>::Surface as Scope>::Node;

/// One running browser process with a single browsing context.
#[async_trait]
pub trait Browser: Send + Sync {
	type Surface: Surface;

	/// The long-lived tab used for search and login.
	fn main_surface(&self) -> &Self::Surface;

	/// Opens the page `node` links to on a new surface.
	///
	/// Follows the node's `href` when it has one; otherwise clicks it on
	/// `from` and captures the surface the click opens.
	async fn open_linked(&self, from: &Self::Surface, node: &NodeOf<Self>, timeout: Duration) -> Result<Self::Surface>;

	/// Closes every surface except the main one. Returns how many were closed.
	async fn close_extra_surfaces(&self) -> Result<usize>;

	async fn cookies(&self) -> Result<Vec<Cookie>>;

	async fn set_cookies(&self, cookies: &[Cookie]) -> Result<()>;

	/// Terminates the browser process.
	async fn close(&mut self) -> Result<()>;
}

/// Starts browser processes.
#[async_trait]
pub trait Launcher: Send + Sync {
	type Browser: Browser;

	async fn launch(&self, options: &LaunchOptions) -> Result<Self::Browser>;
}
