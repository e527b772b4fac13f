use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::Result;

/// Count-based existence check; the commit path uses it to skip duplicate
/// attachment writes under retry.
pub async fn attachment_exists<'e, E>(executor: E, profile_id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attachments WHERE profile_id = $1")
		.bind(profile_id)
		.fetch_one(executor)
		.await?;

	Ok(count > 0)
}

pub async fn insert_attachment<'e, E>(
	executor: E,
	profile_id: Uuid,
	bytes: &[u8],
	created_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO attachments (profile_id, bytes, created_at)
VALUES ($1, $2, $3)",
	)
	.bind(profile_id)
	.bind(bytes)
	.bind(created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_attachment<'e, E>(executor: E, profile_id: Uuid) -> Result<Option<Vec<u8>>>
where
	E: PgExecutor<'e>,
{
	let bytes: Option<Vec<u8>> =
		sqlx::query_scalar("SELECT bytes FROM attachments WHERE profile_id = $1")
			.bind(profile_id)
			.fetch_optional(executor)
			.await?;

	Ok(bytes)
}

pub async fn delete_attachment<'e, E>(executor: E, profile_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("DELETE FROM attachments WHERE profile_id = $1")
		.bind(profile_id)
		.execute(executor)
		.await?;

	Ok(())
}
