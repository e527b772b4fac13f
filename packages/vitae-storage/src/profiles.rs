use serde_json::Value;
use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, models::StoredProfile};

/// Inserts a profile row. Returns `false` when the id already exists; the
/// existing row is left untouched.
pub async fn insert_profile<'e, E>(
	executor: E,
	profile_id: Uuid,
	source_name: &str,
	record: &Value,
	created_at: OffsetDateTime,
) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO candidate_profiles (profile_id, source_name, record, created_at)
VALUES ($1, $2, $3, $4)
ON CONFLICT (profile_id) DO NOTHING",
	)
	.bind(profile_id)
	.bind(source_name)
	.bind(record)
	.bind(created_at)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() == 1)
}

pub async fn get_profile<'e, E>(executor: E, profile_id: Uuid) -> Result<Option<StoredProfile>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, StoredProfile>(
		"\
SELECT
\tprofile_id,
\tsource_name,
\trecord,
\tcreated_at
FROM candidate_profiles
WHERE profile_id = $1
LIMIT 1",
	)
	.bind(profile_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn delete_profile<'e, E>(executor: E, profile_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("DELETE FROM candidate_profiles WHERE profile_id = $1")
		.bind(profile_id)
		.execute(executor)
		.await?;

	Ok(())
}
