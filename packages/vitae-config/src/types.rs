use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub ingest: Ingest,
	pub chunking: Chunking,
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub completion: CompletionProviderConfig,
	pub embedding: EmbeddingProviderConfig,
	pub projects: Option<ProjectsProviderConfig>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_tokens: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectsProviderConfig {
	pub enabled: bool,
	pub api_base: String,
	pub token: Option<String>,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Ingest {
	pub prompt_char_budget: usize,
	pub workers: u32,
	pub rejected_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct Chunking {
	pub max_chars: usize,
	pub overlap_chars: usize,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	pub candidate_k: u32,
	pub score_threshold: f32,
	pub expansion: SearchExpansion,
}

#[derive(Debug, Deserialize)]
pub struct SearchExpansion {
	pub mode: String,
	pub max_queries: u32,
}
