pub mod commit;
pub mod delete;
pub mod index;
pub mod ingest;
pub mod profiles;
pub mod prompt;
pub mod rerank;
pub mod search;
pub mod stores;
pub mod structuring;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use uuid::Uuid;

pub use commit::CommitOutcome;
pub use ingest::IngestOutcome;
pub use search::{RetrieveRequest, RetrieveResponse, SearchResult, Threshold};
use vitae_config::{
	CompletionProviderConfig, Config, EmbeddingProviderConfig, ProjectsProviderConfig,
};
use vitae_providers::{completion, embedding, projects, projects::Project};
use vitae_storage::{db::Db, qdrant::QdrantStore};

pub type ServiceResult<T> = Result<T, Error>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		system: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait ProjectsProvider
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		cfg: &'a ProjectsProviderConfig,
		username: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Project>>>;
}

/// A stored profile row as the service sees it.
#[derive(Clone, Debug)]
pub struct ProfileRow {
	pub profile_id: Uuid,
	pub source_name: String,
	pub record: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
	Created,
	AlreadyExists,
}

pub trait ProfileStore
where
	Self: Send + Sync,
{
	fn insert<'a>(&'a self, profile: &'a ProfileRow) -> BoxFuture<'a, ServiceResult<InsertOutcome>>;
	fn fetch<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<Option<ProfileRow>>>;
	fn delete<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<()>>;
}

pub trait AttachmentStore
where
	Self: Send + Sync,
{
	fn exists<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<bool>>;
	fn insert<'a>(&'a self, profile_id: Uuid, bytes: &'a [u8]) -> BoxFuture<'a, ServiceResult<()>>;
	fn fetch<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<Option<Vec<u8>>>>;
	fn delete<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<()>>;
}

/// One embedded fragment bound for the vector index.
#[derive(Clone, Debug)]
pub struct FragmentPoint {
	pub profile_id: Uuid,
	pub fragment_index: i32,
	pub text: String,
	pub vector: Vec<f32>,
}

/// One similarity hit coming back from the vector index.
#[derive(Clone, Debug)]
pub struct FragmentHit {
	pub profile_id: Uuid,
	pub text: String,
	pub score: f32,
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn upsert<'a>(&'a self, points: &'a [FragmentPoint]) -> BoxFuture<'a, ServiceResult<()>>;
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		k: u32,
	) -> BoxFuture<'a, ServiceResult<Vec<FragmentHit>>>;
	fn delete<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<()>>;
}

#[derive(Debug)]
pub enum Error {
	InvalidRequest { message: String },
	Provider { message: String },
	Storage { message: String },
	Index { message: String },
	Integrity { message: String },
}

/// Routing outcome for a document that cannot be committed. Terminal for the
/// item, never for the batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reject {
	EmptyText,
	CompletionFailed,
	MalformedResponse,
	EmptyRecord,
	RecordWriteFailed,
	AttachmentWriteFailed,
}
impl Reject {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::EmptyText => "EMPTY_TEXT",
			Self::CompletionFailed => "COMPLETION_FAILED",
			Self::MalformedResponse => "MALFORMED_RESPONSE",
			Self::EmptyRecord => "EMPTY_RECORD",
			Self::RecordWriteFailed => "RECORD_WRITE_FAILED",
			Self::AttachmentWriteFailed => "ATTACHMENT_WRITE_FAILED",
		}
	}

	pub fn describe(self) -> &'static str {
		match self {
			Self::EmptyText => "Extracted text is empty.",
			Self::CompletionFailed => "Completion service call failed.",
			Self::MalformedResponse => "Model response is not valid JSON.",
			Self::EmptyRecord => "Model response pruned to an empty record.",
			Self::RecordWriteFailed => "Profile write failed.",
			Self::AttachmentWriteFailed => "Attachment write failed.",
		}
	}
}
impl std::fmt::Display for Reject {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.describe())
	}
}

#[derive(Clone)]
pub struct Providers {
	pub completion: Arc<dyn CompletionProvider>,
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub projects: Arc<dyn ProjectsProvider>,
}

#[derive(Clone)]
pub struct Stores {
	pub profiles: Arc<dyn ProfileStore>,
	pub attachments: Arc<dyn AttachmentStore>,
	pub vectors: Arc<dyn VectorIndex>,
}

pub struct VitaeService {
	pub cfg: Config,
	pub stores: Stores,
	pub providers: Providers,
}

struct DefaultProviders;

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
			Self::Index { message } => write!(f, "Vector index error: {message}"),
			Self::Integrity { message } => write!(f, "Integrity error: {message}"),
		}
	}
}

impl std::error::Error for Error {}

impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<vitae_storage::Error> for Error {
	fn from(err: vitae_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a CompletionProviderConfig,
		system: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(completion::complete(cfg, system, prompt))
	}
}

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl ProjectsProvider for DefaultProviders {
	fn fetch<'a>(
		&'a self,
		cfg: &'a ProjectsProviderConfig,
		username: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Project>>> {
		Box::pin(projects::fetch_projects(cfg, username))
	}
}

impl Providers {
	pub fn new(
		completion: Arc<dyn CompletionProvider>,
		embedding: Arc<dyn EmbeddingProvider>,
		projects: Arc<dyn ProjectsProvider>,
	) -> Self {
		Self { completion, embedding, projects }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { completion: provider.clone(), embedding: provider.clone(), projects: provider }
	}
}

impl VitaeService {
	pub fn new(cfg: Config, db: &Db, qdrant: QdrantStore) -> Self {
		let stores = Stores::postgres_qdrant(db, qdrant);

		Self { cfg, stores, providers: Providers::default() }
	}

	pub fn with_parts(cfg: Config, stores: Stores, providers: Providers) -> Self {
		Self { cfg, stores, providers }
	}
}

pub(crate) fn validate_vector_dim(vec: &[f32], expected_dim: u32) -> ServiceResult<()> {
	if vec.len() != expected_dim as usize {
		return Err(Error::Provider {
			message: format!(
				"Embedding dimension {} does not match configured vector_dim {expected_dim}.",
				vec.len()
			),
		});
	}

	Ok(())
}
