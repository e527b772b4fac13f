use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct StoredProfile {
	pub profile_id: Uuid,
	pub source_name: String,
	pub record: Value,
	pub created_at: OffsetDateTime,
}
