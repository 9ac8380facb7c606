//! Users and groups referenced by setting values

use sqlx::{Row, SqlitePool};

use cairn::meta_adapter::Entity;
use cairn::prelude::*;

use crate::utils::db_err;

pub(crate) async fn read(
	db: &SqlitePool,
	kind: EntityKind,
	id: &EntityId,
) -> ClResult<Option<Entity>> {
	let row = sqlx::query("SELECT name FROM entities WHERE kind = ? AND id = ?")
		.bind(kind.as_str())
		.bind(id.as_str())
		.fetch_optional(db)
		.await
		.map_err(db_err)?;

	match row {
		Some(row) => {
			let name: String = row.try_get("name").map_err(db_err)?;
			Ok(Some(Entity { kind, id: id.clone(), name: name.into() }))
		}
		None => Ok(None),
	}
}

pub(crate) async fn create(db: &SqlitePool, entity: &Entity) -> ClResult<()> {
	sqlx::query("INSERT OR REPLACE INTO entities (kind, id, name) VALUES (?, ?, ?)")
		.bind(entity.kind.as_str())
		.bind(entity.id.as_str())
		.bind(&*entity.name)
		.execute(db)
		.await
		.map_err(db_err)?;

	Ok(())
}

// vim: ts=4
