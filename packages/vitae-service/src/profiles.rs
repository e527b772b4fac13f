use serde_json::Value;
use uuid::Uuid;

use crate::{ServiceResult, VitaeService};

impl VitaeService {
	/// Looks up the structured record for an identifier. A miss is `None`,
	/// never an error.
	pub async fn fetch_profile(&self, profile_id: Uuid) -> ServiceResult<Option<Value>> {
		Ok(self.stores.profiles.fetch(profile_id).await?.map(|profile| profile.record))
	}

	/// Looks up the original attachment bytes for an identifier.
	pub async fn fetch_attachment(&self, profile_id: Uuid) -> ServiceResult<Option<Vec<u8>>> {
		self.stores.attachments.fetch(profile_id).await
	}
}
