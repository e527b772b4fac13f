use std::path::PathBuf;

use clap::Parser;
use color_eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use vitae_service::{RetrieveRequest, Threshold, VitaeService};

#[derive(Debug, Parser)]
#[command(
	version = vitae_cli::VERSION,
	rename_all = "kebab",
	styles = vitae_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// File holding the job description to rank candidates against.
	#[arg(long, value_name = "FILE")]
	pub job_description: PathBuf,
	/// Minimum re-rank score to keep. Defaults to search.score_threshold.
	#[arg(long, conflicts_with = "dynamic_threshold")]
	pub threshold: Option<f32>,
	/// Derive the threshold from the similarity spread instead.
	#[arg(long)]
	pub dynamic_threshold: bool,
}

pub async fn run(args: Args) -> Result<()> {
	let config = vitae_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = vitae_storage::db::Db::connect(&config.storage.postgres).await?;
	db.ensure_schema().await?;

	let qdrant = vitae_storage::qdrant::QdrantStore::new(&config.storage.qdrant)?;
	qdrant.ensure_collection().await?;

	let service = VitaeService::new(config, &db, qdrant);
	let job_description = tokio::fs::read_to_string(&args.job_description)
		.await
		.map_err(|err| eyre::eyre!("Failed to read job description file: {err}."))?;
	let job_description = job_description.trim().to_string();

	if job_description.is_empty() {
		return Err(eyre::eyre!("Job description file is empty."));
	}

	let threshold = if args.dynamic_threshold {
		Threshold::Dynamic
	} else {
		Threshold::Fixed(args.threshold.unwrap_or(service.cfg.search.score_threshold))
	};
	let response = service
		.retrieve(RetrieveRequest { job_description, threshold, candidate_k: None })
		.await?;

	if response.degraded {
		tracing::warn!("Re-ranking unavailable. Results are in retrieval order with placeholder scores.");
	}
	if response.results.is_empty() {
		println!("No matching candidates.");

		return Ok(());
	}

	for (idx, result) in response.results.iter().enumerate() {
		println!("\n{:-^72}", format!(" Result {} ", idx + 1));
		println!("Document ID: {}", result.profile_id);
		println!("Score: {:.4}", result.score);

		if !result.reason.is_empty() {
			println!("Reason: {}", result.reason);
		}

		match service.fetch_profile(result.profile_id).await? {
			Some(record) => println!("\n{}", vitae_domain::render::profile_text(&record)),
			None => tracing::warn!(profile_id = %result.profile_id, "No stored profile for identifier."),
		}
	}

	Ok(())
}
