use serde_json::Value;
use uuid::Uuid;

use crate::{Error, FragmentPoint, ServiceResult, VitaeService, validate_vector_dim};
use vitae_chunking::ChunkingConfig;

impl VitaeService {
	/// Embeds a committed profile into the vector index.
	///
	/// Best-effort enrichment: the caller logs a failure and moves on, the
	/// commit is never rolled back. Returns the number of indexed fragments.
	pub async fn index_profile(&self, profile_id: Uuid, record: &Value) -> ServiceResult<usize> {
		let text = vitae_domain::render::profile_text(record);
		let chunking = ChunkingConfig {
			max_chars: self.cfg.chunking.max_chars,
			overlap_chars: self.cfg.chunking.overlap_chars,
		};
		let fragments = vitae_chunking::split_text(&text, &chunking);

		if fragments.is_empty() {
			return Ok(0);
		}

		let texts: Vec<String> = fragments.iter().map(|fragment| fragment.text.clone()).collect();
		let vectors =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;

		if vectors.len() != fragments.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {} fragments.",
					vectors.len(),
					fragments.len()
				),
			});
		}

		for vector in &vectors {
			validate_vector_dim(vector, self.cfg.storage.qdrant.vector_dim)?;
		}

		let points: Vec<FragmentPoint> = fragments
			.into_iter()
			.zip(vectors)
			.map(|(fragment, vector)| FragmentPoint {
				profile_id,
				fragment_index: fragment.fragment_index,
				text: fragment.text,
				vector,
			})
			.collect();

		self.stores.vectors.upsert(&points).await?;

		tracing::info!(%profile_id, fragments = points.len(), "Indexed profile fragments.");

		Ok(points.len())
	}
}
