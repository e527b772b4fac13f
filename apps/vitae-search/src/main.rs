use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = vitae_search::Args::parse();

	vitae_search::run(args).await
}
