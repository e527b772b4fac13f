use uuid::Uuid;

use crate::{Error, ServiceResult, VitaeService};

impl VitaeService {
	/// Removes a profile together with its attachment and, best effort, its
	/// indexed fragments.
	///
	/// Returns `false` for an unknown identifier. The attachment goes first,
	/// so the window during a removal mirrors the commit's: a profile may
	/// briefly exist without its attachment, never the reverse. Fragment
	/// cleanup is not part of the durability contract; a failure there only
	/// logs.
	pub async fn remove_profile(&self, profile_id: Uuid) -> ServiceResult<bool> {
		if self.stores.profiles.fetch(profile_id).await?.is_none() {
			return Ok(false);
		}

		self.stores.attachments.delete(profile_id).await?;

		if let Err(err) = self.stores.profiles.delete(profile_id).await {
			// Same acknowledged gap as the commit path, surfaced the same way.
			tracing::error!(
				error = %err,
				%profile_id,
				"FATAL integrity: profile delete failed after its attachment was removed."
			);

			return Err(Error::Integrity {
				message: format!("Profile {profile_id} remains without its attachment: {err}"),
			});
		}

		if let Err(err) = self.stores.vectors.delete(profile_id).await {
			tracing::warn!(error = %err, %profile_id, "Fragment cleanup failed. Stale vectors may remain.");
		}

		tracing::info!(%profile_id, "Removed candidate profile.");

		Ok(true)
	}
}
