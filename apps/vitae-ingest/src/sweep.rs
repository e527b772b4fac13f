use std::{
	path::{Path, PathBuf},
	sync::{
		Arc,
		atomic::{AtomicBool, Ordering},
	},
};

use color_eyre::{Report, Result, eyre};
use tokio::{fs, task::JoinSet};

use vitae_service::{Error, IngestOutcome, VitaeService};

const ATTACHMENT_EXTENSIONS: [&str; 3] = ["pdf", "docx", "doc"];

/// One unit of work: the extracted text plus the original document. When no
/// sibling original exists, the text file doubles as its own attachment.
#[derive(Clone, Debug)]
pub struct DocumentPaths {
	pub text_path: PathBuf,
	pub attachment_path: PathBuf,
}
impl DocumentPaths {
	fn source_name(&self) -> String {
		self.text_path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default()
	}
}

#[derive(Clone, Copy, Debug)]
enum Processed {
	Committed,
	Rejected,
	Failed,
}

/// Sweeps a folder of extracted CVs through the pipeline.
///
/// Documents run on a bounded pool of workers; ctrl-c stops dispatching
/// between documents and lets in-flight ones finish, so no item is left
/// half-committed. Per-item failures never abort the sweep; a failed
/// compensation does.
pub async fn run_sweep(service: Arc<VitaeService>, folder: &Path) -> Result<()> {
	let documents = discover_documents(folder).await?;

	if documents.is_empty() {
		tracing::info!(folder = %folder.display(), "No extracted text documents found.");

		return Ok(());
	}

	tracing::info!(folder = %folder.display(), count = documents.len(), "Starting ingest sweep.");

	let rejected_dir = folder.join(&service.cfg.ingest.rejected_dir);
	let workers = service.cfg.ingest.workers.max(1) as usize;
	let shutdown = Arc::new(AtomicBool::new(false));

	{
		let shutdown = shutdown.clone();

		tokio::spawn(async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				tracing::info!("Shutdown requested. Finishing in-flight documents.");
				shutdown.store(true, Ordering::SeqCst);
			}
		});
	}

	let mut tasks: JoinSet<Result<Processed>> = JoinSet::new();
	let mut committed = 0_u32;
	let mut rejected = 0_u32;
	let mut failed = 0_u32;

	for document in documents {
		if shutdown.load(Ordering::SeqCst) {
			tracing::info!("Stopping dispatch before the next document.");

			break;
		}

		while tasks.len() >= workers {
			if let Some(joined) = tasks.join_next().await {
				tally(joined, &mut committed, &mut rejected, &mut failed)?;
			}
		}

		let service = service.clone();
		let rejected_dir = rejected_dir.clone();

		tasks.spawn(async move { process_document(service, document, rejected_dir).await });
	}

	while let Some(joined) = tasks.join_next().await {
		tally(joined, &mut committed, &mut rejected, &mut failed)?;
	}

	tracing::info!(committed, rejected, failed, "Ingest sweep finished.");

	Ok(())
}

fn tally(
	joined: Result<Result<Processed>, tokio::task::JoinError>,
	committed: &mut u32,
	rejected: &mut u32,
	failed: &mut u32,
) -> Result<()> {
	match joined {
		Ok(Ok(Processed::Committed)) => *committed += 1,
		Ok(Ok(Processed::Rejected)) => *rejected += 1,
		Ok(Ok(Processed::Failed)) => *failed += 1,
		// Only integrity failures bubble this far; they halt the sweep.
		Ok(Err(err)) => return Err(err),
		Err(err) => {
			tracing::error!(error = %err, "Ingest worker panicked.");
			*failed += 1;
		},
	}

	Ok(())
}

async fn process_document(
	service: Arc<VitaeService>,
	document: DocumentPaths,
	rejected_dir: PathBuf,
) -> Result<Processed> {
	let source_name = document.source_name();
	let text = match fs::read_to_string(&document.text_path).await {
		Ok(text) => text,
		Err(err) => {
			tracing::warn!(error = %err, source = %source_name, "Failed to read extracted text. Moving to quarantine.");
			move_rejected(&document, "UNREADABLE_TEXT", &rejected_dir).await;

			return Ok(Processed::Rejected);
		},
	};
	let attachment = match fs::read(&document.attachment_path).await {
		Ok(bytes) => bytes,
		Err(err) => {
			tracing::warn!(error = %err, source = %source_name, "Failed to read attachment. Moving to quarantine.");
			move_rejected(&document, "UNREADABLE_ATTACHMENT", &rejected_dir).await;

			return Ok(Processed::Rejected);
		},
	};

	match service.ingest_document(&text, &source_name, &attachment).await {
		Ok(IngestOutcome::Committed { profile_id, indexed_fragments }) => {
			tracing::info!(
				%profile_id,
				fragments = indexed_fragments,
				source = %source_name,
				"Document committed."
			);

			Ok(Processed::Committed)
		},
		Ok(IngestOutcome::Rejected { reason }) => {
			tracing::warn!(source = %source_name, reason = reason.as_str(), "Document rejected.");
			move_rejected(&document, reason.as_str(), &rejected_dir).await;

			Ok(Processed::Rejected)
		},
		Err(err @ Error::Integrity { .. }) => Err(Report::new(err)),
		Err(err) => {
			tracing::error!(error = %err, source = %source_name, "Document processing failed.");

			Ok(Processed::Failed)
		},
	}
}

/// Pairs every `*.txt` file with its sibling original when one exists.
pub async fn discover_documents(folder: &Path) -> Result<Vec<DocumentPaths>> {
	let mut entries = fs::read_dir(folder).await?;
	let mut documents = Vec::new();

	while let Some(entry) = entries.next_entry().await? {
		let path = entry.path();

		if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
			continue;
		}

		let mut attachment_path = path.clone();

		for extension in ATTACHMENT_EXTENSIONS {
			let candidate = path.with_extension(extension);

			if fs::try_exists(&candidate).await.unwrap_or(false) {
				attachment_path = candidate;

				break;
			}
		}

		documents.push(DocumentPaths { text_path: path, attachment_path });
	}

	documents.sort_by(|left, right| left.text_path.cmp(&right.text_path));

	Ok(documents)
}

/// Quarantines a document: moves its files into the rejected folder and
/// writes the reason as a sidecar next to them.
async fn move_rejected(document: &DocumentPaths, reason: &str, rejected_dir: &Path) {
	if let Err(err) = try_move_rejected(document, reason, rejected_dir).await {
		tracing::error!(error = %err, text_path = %document.text_path.display(), "Failed to quarantine rejected document.");
	}
}

async fn try_move_rejected(
	document: &DocumentPaths,
	reason: &str,
	rejected_dir: &Path,
) -> Result<()> {
	fs::create_dir_all(rejected_dir).await?;

	let text_name = document
		.text_path
		.file_name()
		.ok_or_else(|| eyre::eyre!("Rejected document has no file name."))?;
	let text_target = rejected_dir.join(text_name);

	fs::rename(&document.text_path, &text_target).await?;

	if document.attachment_path != document.text_path
		&& let Some(attachment_name) = document.attachment_path.file_name()
	{
		fs::rename(&document.attachment_path, rejected_dir.join(attachment_name)).await?;
	}

	let reason_path =
		rejected_dir.join(format!("{}.reason.txt", text_name.to_string_lossy()));

	fs::write(reason_path, reason).await?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	async fn scratch_dir() -> PathBuf {
		let dir =
			std::env::temp_dir().join(format!("vitae_sweep_{}", uuid::Uuid::new_v4().simple()));

		fs::create_dir_all(&dir).await.expect("Failed to create scratch dir.");

		dir
	}

	#[tokio::test]
	async fn pairs_text_with_sibling_original() {
		let dir = scratch_dir().await;

		fs::write(dir.join("ada.txt"), "extracted").await.expect("write failed");
		fs::write(dir.join("ada.pdf"), "%PDF-1.4").await.expect("write failed");
		fs::write(dir.join("grace.txt"), "extracted").await.expect("write failed");
		fs::write(dir.join("notes.md"), "ignored").await.expect("write failed");

		let documents = discover_documents(&dir).await.expect("discover failed");

		assert_eq!(documents.len(), 2);
		assert_eq!(documents[0].text_path, dir.join("ada.txt"));
		assert_eq!(documents[0].attachment_path, dir.join("ada.pdf"));
		// No sibling original: the text file is its own attachment.
		assert_eq!(documents[1].attachment_path, dir.join("grace.txt"));

		fs::remove_dir_all(&dir).await.expect("cleanup failed");
	}

	#[tokio::test]
	async fn quarantine_moves_files_and_writes_the_reason() {
		let dir = scratch_dir().await;
		let rejected_dir = dir.join("rejected");

		fs::write(dir.join("ada.txt"), "extracted").await.expect("write failed");
		fs::write(dir.join("ada.pdf"), "%PDF-1.4").await.expect("write failed");

		let document = DocumentPaths {
			text_path: dir.join("ada.txt"),
			attachment_path: dir.join("ada.pdf"),
		};

		move_rejected(&document, "MALFORMED_RESPONSE", &rejected_dir).await;

		assert!(!fs::try_exists(dir.join("ada.txt")).await.expect("exists failed"));
		assert!(fs::try_exists(rejected_dir.join("ada.txt")).await.expect("exists failed"));
		assert!(fs::try_exists(rejected_dir.join("ada.pdf")).await.expect("exists failed"));

		let reason = fs::read_to_string(rejected_dir.join("ada.txt.reason.txt"))
			.await
			.expect("reason sidecar missing");

		assert_eq!(reason, "MALFORMED_RESPONSE");

		fs::remove_dir_all(&dir).await.expect("cleanup failed");
	}
}
