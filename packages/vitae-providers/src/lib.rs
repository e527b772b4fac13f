pub mod completion;
pub mod embedding;
pub mod projects;

use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::{Map, Value};

/// Every provider call runs on its own short-lived client with the
/// per-provider timeout from the config.
pub(crate) fn http_client(timeout_ms: u64) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?)
}

/// Bearer auth plus any extra headers configured for the provider.
pub(crate) fn bearer_headers(api_key: &str, extra: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::with_capacity(extra.len() + 1);
	let token: HeaderValue = format!("Bearer {api_key}").parse()?;

	headers.insert(AUTHORIZATION, token);

	for (name, value) in extra {
		let raw = value
			.as_str()
			.ok_or_else(|| eyre::eyre!("Header {name} must have a string value."))?;

		headers.insert(HeaderName::from_bytes(name.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
