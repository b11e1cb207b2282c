//! Ordered selector fallbacks for one UI concept.
//!
//! The site's markup drifts, so every element the workflow needs is described
//! by a [`SelectorChain`]: candidates are tried in order and the first one
//! that yields a non-empty match wins. A query that errors counts as no match.

use std::time::Duration;

use jobpilot_runtime::Scope;
use tracing::debug;

/// One way of locating a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
	Css(&'static str),
	/// Elements matching `css` whose text contains any of `text`.
	CssWithText { css: &'static str, text: &'static [&'static str] },
	/// Present when the scope's rendered text contains any needle. Never yields nodes.
	Text(&'static [&'static str]),
}

impl Candidate {
	async fn nodes<S: Scope>(&self, scope: &S, concept: &str) -> Vec<S::Node> {
		match self {
			Candidate::Css(css) => query(scope, css, concept).await,
			Candidate::CssWithText { css, text } => {
				let mut matched = Vec::new();
				for node in query(scope, css, concept).await {
					match node.text().await {
						Ok(content) if text.iter().any(|needle| content.contains(needle)) => matched.push(node),
						Ok(_) => {}
						Err(err) => debug!(target = "jobpilot", concept, error = %err, "candidate text unreadable"),
					}
				}
				matched
			}
			Candidate::Text(_) => Vec::new(),
		}
	}

	async fn present<S: Scope>(&self, scope: &S, concept: &str) -> bool {
		match self {
			Candidate::Text(needles) => match scope.text().await {
				Ok(content) => needles.iter().any(|needle| content.contains(needle)),
				Err(err) => {
					debug!(target = "jobpilot", concept, error = %err, "page text unreadable");
					false
				}
			},
			_ => !self.nodes(scope, concept).await.is_empty(),
		}
	}
}

async fn query<S: Scope>(scope: &S, css: &str, concept: &str) -> Vec<S::Node> {
	match scope.query_all(css).await {
		Ok(nodes) => nodes,
		Err(err) => {
			debug!(target = "jobpilot", concept, css, error = %err, "selector query failed");
			Vec::new()
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorChain {
	pub concept: &'static str,
	pub candidates: &'static [Candidate],
}

impl SelectorChain {
	pub const fn new(concept: &'static str, candidates: &'static [Candidate]) -> Self {
		Self { concept, candidates }
	}

	/// All nodes matched by the first candidate that matches anything.
	pub async fn resolve_all<S: Scope>(&self, scope: &S) -> Vec<S::Node> {
		for candidate in self.candidates {
			let nodes = candidate.nodes(scope, self.concept).await;
			if !nodes.is_empty() {
				return nodes;
			}
		}
		Vec::new()
	}

	pub async fn first<S: Scope>(&self, scope: &S) -> Option<S::Node> {
		self.resolve_all(scope).await.into_iter().next()
	}

	/// Trimmed text of the first matching node with non-empty text.
	pub async fn first_text<S: Scope>(&self, scope: &S) -> Option<String> {
		for candidate in self.candidates {
			for node in candidate.nodes(scope, self.concept).await {
				if let Ok(text) = node.text().await {
					let text = text.trim();
					if !text.is_empty() {
						return Some(text.to_string());
					}
				}
			}
		}
		None
	}

	/// True when any candidate matches.
	pub async fn present<S: Scope>(&self, scope: &S) -> bool {
		for candidate in self.candidates {
			if candidate.present(scope, self.concept).await {
				return true;
			}
		}
		false
	}

	/// Polls until the chain resolves to at least one node or `timeout` passes.
	pub async fn wait_for<S: Scope>(&self, scope: &S, timeout: Duration, poll: Duration) -> Vec<S::Node> {
		let deadline = tokio::time::Instant::now() + timeout;
		loop {
			let nodes = self.resolve_all(scope).await;
			if !nodes.is_empty() || tokio::time::Instant::now() >= deadline {
				return nodes;
			}
			tokio::time::sleep(poll).await;
		}
	}
}
