//! Job discovery and the apply loop.
//!
//! `search` loads the results page for a keyword and city and returns the
//! job cards in discovery order. `apply` walks the first `count` cards,
//! opens each on its own surface and clicks the chat button. Failures on a
//! single listing are logged and counted; only a missing session, an empty
//! result page or a dead browser abort the run.

pub mod listing;

use std::time::Duration;

use jobpilot_protocol::ProgressEvent;
use jobpilot_runtime::{Browser, Launcher, Node, NodeOf, Scope, Surface};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::session::SessionManager;
use crate::site;

pub use listing::{ApplyReport, JobListing, ListingDetails, ListingOutcome};

const RESULTS_POLL: Duration = Duration::from_millis(500);

pub type Listing<L> = JobListing<NodeOf<<L as Launcher>::Browser>>;

pub struct ApplyWorkflow<'a, L: Launcher> {
	session: &'a mut SessionManager<L>,
}

impl<'a, L: Launcher> ApplyWorkflow<'a, L> {
	pub fn new(session: &'a mut SessionManager<L>) -> Self {
		Self { session }
	}

	/// Loads search results for `keyword` in `city`.
	///
	/// When no results appear and the login probes fail, logs in and retries
	/// the search once. A failed login is returned as an error.
	pub async fn search(&mut self, keyword: &str, city: &str) -> Result<Vec<Listing<L>>> {
		let url = site::search_url(keyword, city)?;
		info!(target = "jobpilot", keyword, city, region = site::region_code(city), "searching listings");

		let mut cards = self.load_results(&url).await?;
		if cards.is_empty() && !self.session.probe().await? {
			warn!(target = "jobpilot", "results hidden behind login");
			self.session.perform_login().await?;
			cards = self.load_results(&url).await?;
		}

		info!(target = "jobpilot", found = cards.len(), "listings discovered");
		Ok(cards.into_iter().enumerate().map(|(position, handle)| JobListing { position, handle }).collect())
	}

	async fn load_results(&self, url: &str) -> Result<Vec<NodeOf<L::Browser>>> {
		let timeouts = self.session.timeouts();
		let surface = self.session.browser()?.main_surface();
		if let Err(err) = surface.goto(url, timeouts.navigation()).await {
			if err.is_browser_level() {
				return Err(err.into());
			}
			warn!(target = "jobpilot", error = %err, "search page load failed");
		}
		tokio::time::sleep(timeouts.settle()).await;
		Ok(site::RESULTS.wait_for(surface, timeouts.results(), RESULTS_POLL).await)
	}

	/// Applies to up to `count` listings for `keyword` in `city`, calling
	/// `on_progress` after each one.
	pub async fn apply(
		&mut self,
		keyword: &str,
		city: &str,
		count: u32,
		on_progress: &mut (dyn FnMut(ProgressEvent) + Send),
	) -> Result<ApplyReport> {
		self.session.require_login().await?;

		let listings = self.search(keyword, city).await?;
		if listings.is_empty() {
			return Err(EngineError::NoListings {
				keyword: keyword.to_string(),
				city: city.to_string(),
			});
		}

		let total = listings.len().min(count as usize);
		let mut report = ApplyReport {
			discovered: listings.len(),
			..Default::default()
		};
		info!(target = "jobpilot", total, discovered = report.discovered, "applying");

		for listing in listings.into_iter().take(total) {
			let details = listing.details().await;
			info!(target = "jobpilot", position = listing.position + 1, total, listing = %details, "processing listing");

			let outcome = match self.apply_one(&listing).await {
				Ok(outcome) => outcome,
				Err(err) if err.needs_browser_restart() => return Err(err),
				Err(err) => {
					warn!(target = "jobpilot", position = listing.position + 1, error = %err, "listing failed");
					self.close_stray_surfaces().await;
					ListingOutcome::Failed(err.to_string())
				}
			};
			report.record(&outcome);
			debug!(target = "jobpilot", position = listing.position + 1, outcome = %outcome, "listing done");

			on_progress(ProgressEvent::step(
				report.processed,
				total,
				format!("{}/{} {details}: {outcome}", report.processed, total),
			));

			if report.processed < total {
				tokio::time::sleep(self.session.timeouts().between_listings()).await;
			}
		}

		info!(target = "jobpilot", report = %report, "apply run finished");
		Ok(report)
	}

	async fn apply_one(&self, listing: &Listing<L>) -> Result<ListingOutcome> {
		let timeouts = self.session.timeouts();
		let browser = self.session.browser()?;

		let link = site::CARD_LINK.first(&listing.handle).await;
		let target = link.as_ref().unwrap_or(&listing.handle);
		let detail = browser.open_linked(browser.main_surface(), target, timeouts.navigation()).await?;

		let outcome = self.contact(&detail).await;
		if let Err(err) = detail.close().await {
			debug!(target = "jobpilot", error = %err, "detail surface close failed");
		}
		outcome
	}

	async fn contact<S: Surface>(&self, detail: &S) -> Result<ListingOutcome> {
		let timeouts = self.session.timeouts();
		tokio::time::sleep(timeouts.detail()).await;

		let Some(button) = site::CHAT_BUTTON.first(detail).await else {
			return Ok(ListingOutcome::NoControl);
		};
		let label = button.text().await?;
		if site::EXISTING_CONVERSATION.iter().any(|existing| label.contains(existing)) {
			return Ok(ListingOutcome::AlreadyContacted);
		}

		button.click().await?;
		tokio::time::sleep(timeouts.after_apply()).await;
		Ok(ListingOutcome::Applied)
	}

	async fn close_stray_surfaces(&self) {
		let Ok(browser) = self.session.browser() else {
			return;
		};
		match browser.close_extra_surfaces().await {
			Ok(0) => {}
			Ok(closed) => debug!(target = "jobpilot", closed, "closed stray surfaces"),
			Err(err) => debug!(target = "jobpilot", error = %err, "failed to close stray surfaces"),
		}
	}
}

#[cfg(test)]
mod tests;
