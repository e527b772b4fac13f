use color_eyre::{Result, eyre};
use reqwest::header::{AUTHORIZATION, HeaderMap, USER_AGENT};
use serde_json::Value;

const PAGE_SIZE: u32 = 100;
const MAX_PAGES: u32 = 10;

/// A public project listing used to enrich the structuring prompt.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Project {
	pub repository_name: String,
	pub description: String,
	pub repository_url: String,
}

/// Fetches the candidate's public repositories, page by page.
pub async fn fetch_projects(
	cfg: &vitae_config::ProjectsProviderConfig,
	username: &str,
) -> Result<Vec<Project>> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}/users/{username}/repos", cfg.api_base.trim_end_matches('/'));
	let mut headers = HeaderMap::new();

	headers.insert(USER_AGENT, "vitae".parse()?);

	if let Some(token) = cfg.token.as_deref() {
		headers.insert(AUTHORIZATION, format!("token {token}").parse()?);
	}

	let mut projects = Vec::new();

	for page in 1..=MAX_PAGES {
		let res = client
			.get(&url)
			.headers(headers.clone())
			.query(&[("page", page), ("per_page", PAGE_SIZE)])
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;
		let repos = json
			.as_array()
			.ok_or_else(|| eyre::eyre!("Project listing response is not an array."))?;

		if repos.is_empty() {
			break;
		}

		for repo in repos {
			projects.push(parse_project(repo));
		}
	}

	Ok(projects)
}

fn parse_project(repo: &Value) -> Project {
	let text = |key: &str| repo.get(key).and_then(Value::as_str).map(str::to_string);

	Project {
		repository_name: text("name").unwrap_or_default(),
		description: text("description").unwrap_or_else(|| "No description provided".to_string()),
		repository_url: text("html_url").unwrap_or_default(),
	}
}
