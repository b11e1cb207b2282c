//! Intent resolution: turning a task's free text into search parameters.

pub mod chat;
pub mod lookup;

use async_trait::async_trait;
use jobpilot_protocol::{ApplyIntent, IntentDefaults, IntentHints, UserConfig};
use tracing::warn;

use crate::error::Result;
use crate::settings::{IntentProvider, IntentSettings};

pub use chat::ChatResolver;
pub use lookup::LookupResolver;

/// Extracts whatever search parameters a text states.
#[async_trait]
pub trait IntentResolver: Send + Sync {
	async fn resolve(&self, text: &str) -> Result<IntentHints>;
}

pub fn resolver_from_settings(settings: &IntentSettings) -> Result<Box<dyn IntentResolver>> {
	Ok(match settings.provider {
		IntentProvider::Lookup => Box::new(LookupResolver),
		IntentProvider::Chat => Box::new(ChatResolver::new(settings)?),
	})
}

/// Resolves `text` and fills the gaps from `user` and `defaults`. A resolver
/// error is logged and every field falls back.
pub async fn resolve_intent(resolver: &dyn IntentResolver, text: &str, user: &UserConfig, defaults: &IntentDefaults) -> ApplyIntent {
	let hints = match resolver.resolve(text).await {
		Ok(hints) => hints,
		Err(err) => {
			warn!(target = "jobpilot", error = %err, "intent resolution failed, using defaults");
			IntentHints::default()
		}
	};
	hints.complete(user, defaults)
}
