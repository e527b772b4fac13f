mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chunking, CompletionProviderConfig, Config, EmbeddingProviderConfig, Ingest, Postgres,
	ProjectsProviderConfig, Providers, Qdrant, Search, SearchExpansion, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.completion.max_tokens == 0 {
		return Err(Error::Validation {
			message: "providers.completion.max_tokens must be greater than zero.".to_string(),
		});
	}
	if cfg.ingest.prompt_char_budget == 0 {
		return Err(Error::Validation {
			message: "ingest.prompt_char_budget must be greater than zero.".to_string(),
		});
	}
	if cfg.ingest.workers == 0 {
		return Err(Error::Validation {
			message: "ingest.workers must be greater than zero.".to_string(),
		});
	}
	if cfg.ingest.rejected_dir.trim().is_empty() {
		return Err(Error::Validation {
			message: "ingest.rejected_dir must be non-empty.".to_string(),
		});
	}
	if cfg.chunking.max_chars == 0 {
		return Err(Error::Validation {
			message: "chunking.max_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.overlap_chars >= cfg.chunking.max_chars {
		return Err(Error::Validation {
			message: "chunking.overlap_chars must be less than chunking.max_chars.".to_string(),
		});
	}
	if cfg.search.candidate_k == 0 {
		return Err(Error::Validation {
			message: "search.candidate_k must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.search.score_threshold) {
		return Err(Error::Validation {
			message: "search.score_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}

	let expansion_mode = cfg.search.expansion.mode.as_str();

	if !matches!(expansion_mode, "off" | "always") {
		return Err(Error::Validation {
			message: "search.expansion.mode must be one of off or always.".to_string(),
		});
	}
	if cfg.search.expansion.max_queries == 0 {
		return Err(Error::Validation {
			message: "search.expansion.max_queries must be greater than zero.".to_string(),
		});
	}

	for (label, key) in [
		("completion", &cfg.providers.completion.api_key),
		("embedding", &cfg.providers.embedding.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if let Some(projects) = cfg.providers.projects.as_ref()
		&& projects.enabled
		&& projects.api_base.trim().is_empty()
	{
		return Err(Error::Validation {
			message: "providers.projects.api_base must be non-empty when enabled.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if let Some(projects) = cfg.providers.projects.as_mut()
		&& projects.token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		projects.token = None;
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
