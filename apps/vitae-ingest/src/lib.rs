use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vitae_service::VitaeService;

pub mod sweep;

#[derive(Debug, Parser)]
#[command(
	version = vitae_cli::VERSION,
	rename_all = "kebab",
	styles = vitae_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Folder of extracted CV text files (`*.txt`), with the original
	/// documents as optional siblings.
	#[arg(value_name = "FOLDER")]
	pub folder: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = vitae_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = vitae_storage::db::Db::connect(&config.storage.postgres).await?;
	db.ensure_schema().await?;

	let qdrant = vitae_storage::qdrant::QdrantStore::new(&config.storage.qdrant)?;
	qdrant.ensure_collection().await?;

	let service = Arc::new(VitaeService::new(config, &db, qdrant));

	sweep::run_sweep(service, &args.folder).await
}
