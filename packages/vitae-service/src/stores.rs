use std::{collections::HashMap, sync::Arc};

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, DeletePointsBuilder, Filter, PointStruct, Query, QueryPointsBuilder,
		ScoredPoint, UpsertPointsBuilder, Value, value::Kind,
	},
};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	AttachmentStore, BoxFuture, Error, FragmentHit, FragmentPoint, InsertOutcome, ProfileRow,
	ProfileStore, ServiceResult, Stores, VectorIndex,
};
use vitae_storage::{attachments, db::Db, profiles, qdrant::QdrantStore};

pub struct PgProfileStore {
	pub pool: PgPool,
}

pub struct PgAttachmentStore {
	pub pool: PgPool,
}

pub struct QdrantIndex {
	pub store: QdrantStore,
}

impl Stores {
	pub fn postgres_qdrant(db: &Db, qdrant: QdrantStore) -> Self {
		Self {
			profiles: Arc::new(PgProfileStore { pool: db.pool.clone() }),
			attachments: Arc::new(PgAttachmentStore { pool: db.pool.clone() }),
			vectors: Arc::new(QdrantIndex { store: qdrant }),
		}
	}
}

impl ProfileStore for PgProfileStore {
	fn insert<'a>(&'a self, profile: &'a ProfileRow) -> BoxFuture<'a, ServiceResult<InsertOutcome>> {
		Box::pin(async move {
			let created = profiles::insert_profile(
				&self.pool,
				profile.profile_id,
				&profile.source_name,
				&profile.record,
				OffsetDateTime::now_utc(),
			)
			.await?;

			Ok(if created { InsertOutcome::Created } else { InsertOutcome::AlreadyExists })
		})
	}

	fn fetch<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<Option<ProfileRow>>> {
		Box::pin(async move {
			let row = profiles::get_profile(&self.pool, profile_id).await?;

			Ok(row.map(|row| ProfileRow {
				profile_id: row.profile_id,
				source_name: row.source_name,
				record: row.record,
			}))
		})
	}

	fn delete<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<()>> {
		Box::pin(async move {
			profiles::delete_profile(&self.pool, profile_id).await?;

			Ok(())
		})
	}
}

impl AttachmentStore for PgAttachmentStore {
	fn exists<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<bool>> {
		Box::pin(async move { Ok(attachments::attachment_exists(&self.pool, profile_id).await?) })
	}

	fn insert<'a>(&'a self, profile_id: Uuid, bytes: &'a [u8]) -> BoxFuture<'a, ServiceResult<()>> {
		Box::pin(async move {
			attachments::insert_attachment(
				&self.pool,
				profile_id,
				bytes,
				OffsetDateTime::now_utc(),
			)
			.await?;

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<Option<Vec<u8>>>> {
		Box::pin(async move { Ok(attachments::get_attachment(&self.pool, profile_id).await?) })
	}

	fn delete<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<()>> {
		Box::pin(async move {
			attachments::delete_attachment(&self.pool, profile_id).await?;

			Ok(())
		})
	}
}

impl VectorIndex for QdrantIndex {
	fn upsert<'a>(&'a self, points: &'a [FragmentPoint]) -> BoxFuture<'a, ServiceResult<()>> {
		Box::pin(async move {
			let mut structs = Vec::with_capacity(points.len());

			for point in points {
				let mut payload_map = HashMap::new();

				payload_map
					.insert("profile_id".to_string(), Value::from(point.profile_id.to_string()));
				payload_map.insert(
					"fragment_index".to_string(),
					Value::from(point.fragment_index as i64),
				);
				payload_map.insert("text".to_string(), Value::from(point.text.clone()));

				structs.push(PointStruct::new(
					fragment_point_id(point.profile_id, point.fragment_index).to_string(),
					point.vector.clone(),
					Payload::from(payload_map),
				));
			}

			let upsert = UpsertPointsBuilder::new(self.store.collection.clone(), structs).wait(true);

			self.store
				.client
				.upsert_points(upsert)
				.await
				.map_err(|err| Error::Index { message: err.to_string() })?;

			Ok(())
		})
	}

	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		k: u32,
	) -> BoxFuture<'a, ServiceResult<Vec<FragmentHit>>> {
		Box::pin(async move {
			let query = QueryPointsBuilder::new(self.store.collection.clone())
				.query(Query::new_nearest(vector))
				.with_payload(true)
				.limit(k as u64);
			let response = self
				.store
				.client
				.query(query)
				.await
				.map_err(|err| Error::Index { message: err.to_string() })?;

			Ok(collect_hits(&response.result))
		})
	}

	fn delete<'a>(&'a self, profile_id: Uuid) -> BoxFuture<'a, ServiceResult<()>> {
		Box::pin(async move {
			let filter = Filter::must([Condition::matches("profile_id", profile_id.to_string())]);
			let delete =
				DeletePointsBuilder::new(self.store.collection.clone()).points(filter).wait(true);

			self.store
				.client
				.delete_points(delete)
				.await
				.map_err(|err| Error::Index { message: err.to_string() })?;

			Ok(())
		})
	}
}

/// Deterministic point id so re-indexing a profile overwrites its fragments.
pub fn fragment_point_id(profile_id: Uuid, fragment_index: i32) -> Uuid {
	let name = format!("{profile_id}:{fragment_index}");

	Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

fn collect_hits(points: &[ScoredPoint]) -> Vec<FragmentHit> {
	let mut out = Vec::with_capacity(points.len());

	for point in points {
		let Some(profile_id) = payload_uuid(&point.payload, "profile_id") else {
			tracing::warn!("Fragment hit missing profile_id payload.");

			continue;
		};
		let text = payload_string(&point.payload, "text").unwrap_or_default();

		out.push(FragmentHit { profile_id, text, score: point.score });
	}

	out
}

fn payload_uuid(payload: &HashMap<String, Value>, key: &str) -> Option<Uuid> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Uuid::parse_str(text).ok(),
		_ => None,
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fragment_point_ids_are_stable_per_fragment() {
		let profile_id = Uuid::new_v4();
		let first = fragment_point_id(profile_id, 0);

		assert_eq!(first, fragment_point_id(profile_id, 0));
		assert_ne!(first, fragment_point_id(profile_id, 1));
	}
}
