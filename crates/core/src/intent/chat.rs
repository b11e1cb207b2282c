//! Intent extraction through an OpenAI-compatible chat completion endpoint.

use std::time::Duration;

use async_trait::async_trait;
use jobpilot_protocol::IntentHints;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::IntentResolver;
use super::lookup::LookupResolver;
use crate::error::{EngineError, Result};
use crate::settings::IntentSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "You extract job-search parameters from a Chinese or English request. \
Reply with a single JSON object and nothing else: \
{\"keyword\": job title or skill, \"city\": Chinese city name, \"count\": number of applications}. \
Use null for anything the request does not state.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
	model: &'a str,
	messages: Vec<Message<'a>>,
	temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
	role: &'a str,
	content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
	choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
	message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
	content: String,
}

/// Asks a chat model for the intent. Any failure, and any field the model
/// leaves out, falls back to [`LookupResolver`].
pub struct ChatResolver {
	http: reqwest::Client,
	base_url: String,
	model: String,
	api_key_env: String,
}

impl ChatResolver {
	pub fn new(settings: &IntentSettings) -> Result<Self> {
		let http = reqwest::Client::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|err| EngineError::Intent(format!("http client: {err}")))?;
		Ok(Self {
			http,
			base_url: settings.base_url.trim_end_matches('/').to_string(),
			model: settings.model.clone(),
			api_key_env: settings.api_key_env.clone(),
		})
	}

	async fn ask(&self, text: &str) -> Result<IntentHints> {
		let api_key = std::env::var(&self.api_key_env).map_err(|_| EngineError::Intent(format!("{} is not set", self.api_key_env)))?;

		let request = ChatRequest {
			model: &self.model,
			messages: vec![
				Message {
					role: "system",
					content: SYSTEM_PROMPT,
				},
				Message { role: "user", content: text },
			],
			temperature: 0.0,
		};

		let response = self
			.http
			.post(format!("{}/chat/completions", self.base_url))
			.bearer_auth(api_key)
			.json(&request)
			.send()
			.await
			.map_err(|err| EngineError::Intent(format!("request failed: {err}")))?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(EngineError::Intent(format!("chat api returned {status}: {body}")));
		}

		let response: ChatResponse = response.json().await.map_err(|err| EngineError::Intent(format!("bad response: {err}")))?;
		let content = response
			.choices
			.into_iter()
			.next()
			.map(|choice| choice.message.content)
			.ok_or_else(|| EngineError::Intent("empty chat response".to_string()))?;

		debug!(target = "jobpilot", model = %self.model, reply = %content, "chat intent reply");
		parse_reply(&content)
	}
}

#[async_trait]
impl IntentResolver for ChatResolver {
	async fn resolve(&self, text: &str) -> Result<IntentHints> {
		let fallback = LookupResolver::extract(text);
		match self.ask(text).await {
			Ok(hints) => Ok(IntentHints {
				keyword: hints.keyword.or(fallback.keyword),
				city: hints.city.or(fallback.city),
				count: hints.count.or(fallback.count),
			}),
			Err(err) => {
				warn!(target = "jobpilot", error = %err, "chat intent failed, using lookup");
				Ok(fallback)
			}
		}
	}
}

/// Parses the model's JSON reply, tolerating markdown fences and counts
/// given as strings.
fn parse_reply(content: &str) -> Result<IntentHints> {
	let body = strip_fences(content);
	let value: Value = serde_json::from_str(body).map_err(|err| EngineError::Intent(format!("reply is not JSON: {err}")))?;

	let text = |key: &str| {
		value
			.get(key)
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|v| !v.is_empty() && *v != "null")
			.map(str::to_string)
	};
	let count = match value.get("count") {
		Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
		Some(Value::String(s)) => s.trim().parse().ok(),
		_ => None,
	};

	Ok(IntentHints {
		keyword: text("keyword"),
		city: text("city"),
		count: count.filter(|n| *n > 0),
	})
}

fn strip_fences(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(rest) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let rest = rest.strip_prefix("json").unwrap_or(rest);
	rest.strip_suffix("```").unwrap_or(rest).trim()
}
