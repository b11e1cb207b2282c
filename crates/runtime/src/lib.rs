//! Browser runtime for jobpilot.
//!
//! [`driver`] defines the narrow set of browser operations the engine
//! needs; [`chromium`] implements them over the Chrome DevTools Protocol.

pub mod chromium;
pub mod driver;
pub mod error;
pub mod launch;

pub use chromium::{ChromiumBrowser, ChromiumLauncher, ChromiumNode, ChromiumSurface};
pub use driver::{Browser, Launcher, Node, NodeOf, Scope, Surface};
pub use error::{Error, Result};
pub use launch::{DEFAULT_USER_AGENT, LaunchOptions, STEALTH_SCRIPT};
