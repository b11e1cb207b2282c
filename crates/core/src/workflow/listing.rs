use std::fmt;

use jobpilot_runtime::Scope;

use crate::site;

pub const UNKNOWN_POSITION: &str = "unknown position";
pub const UNKNOWN_COMPANY: &str = "unknown company";

/// A job card found on the results page. Only valid while that page is loaded.
pub struct JobListing<N> {
	/// Zero-based discovery position.
	pub position: usize,
	pub handle: N,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDetails {
	pub title: String,
	pub company: String,
	pub salary: String,
}

impl<N: Scope> JobListing<N> {
	/// Display fields read from the card, with placeholders for missing ones.
	pub async fn details(&self) -> ListingDetails {
		ListingDetails {
			title: site::CARD_TITLE.first_text(&self.handle).await.unwrap_or_else(|| UNKNOWN_POSITION.to_string()),
			company: site::CARD_COMPANY.first_text(&self.handle).await.unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
			salary: site::CARD_SALARY.first_text(&self.handle).await.unwrap_or_default(),
		}
	}
}

impl fmt::Display for ListingDetails {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} @ {}", self.title, self.company)?;
		if !self.salary.is_empty() {
			write!(f, " ({})", self.salary)?;
		}
		Ok(())
	}
}

/// What happened to one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingOutcome {
	Applied,
	/// The chat control says a conversation already exists.
	AlreadyContacted,
	/// No chat control on the detail page.
	NoControl,
	Failed(String),
}

impl fmt::Display for ListingOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ListingOutcome::Applied => f.write_str("applied"),
			ListingOutcome::AlreadyContacted => f.write_str("already contacted"),
			ListingOutcome::NoControl => f.write_str("no chat button"),
			ListingOutcome::Failed(reason) => write!(f, "failed: {reason}"),
		}
	}
}

/// Per-run counts. `applied + skipped + failed == processed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
	pub discovered: usize,
	pub processed: usize,
	pub applied: usize,
	pub skipped: usize,
	pub failed: usize,
}

impl ApplyReport {
	pub fn record(&mut self, outcome: &ListingOutcome) {
		self.processed += 1;
		match outcome {
			ListingOutcome::Applied => self.applied += 1,
			ListingOutcome::AlreadyContacted | ListingOutcome::NoControl => self.skipped += 1,
			ListingOutcome::Failed(_) => self.failed += 1,
		}
	}
}

impl fmt::Display for ApplyReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"applied {} of {} ({} skipped, {} failed, {} found)",
			self.applied, self.processed, self.skipped, self.failed, self.discovered
		)
	}
}
