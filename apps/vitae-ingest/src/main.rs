use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = vitae_ingest::Args::parse();

	vitae_ingest::run(args).await
}
