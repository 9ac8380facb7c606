//! Index introspection and maintenance on the settings table

use sqlx::{Row, SqlitePool};

use cairn::meta_adapter::{DuplicateGroup, IndexInfo};
use cairn::prelude::*;

use crate::utils::{collect_res, db_err, parse_id_list, quote_ident};

const SETTINGS_COLUMNS: [&str; 2] = ["key", "value"];

/// List indexes on the settings table with their columns
pub(crate) async fn list(db: &SqlitePool) -> ClResult<Vec<IndexInfo>> {
	let rows = sqlx::query("SELECT name, \"unique\" FROM pragma_index_list('settings') ORDER BY seq")
		.fetch_all(db)
		.await
		.map_err(db_err)?;

	let mut indexes = Vec::with_capacity(rows.len());
	for row in rows {
		let name: String = row.try_get("name").map_err(db_err)?;
		let unique: bool = row.try_get("unique").map_err(db_err)?;

		let columns =
			sqlx::query("SELECT name FROM pragma_index_info(?) ORDER BY seqno")
				.bind(&name)
				.fetch_all(db)
				.await
				.map_err(db_err)?;
		let fields = collect_res(columns.iter().map(|col| {
			// expression columns have no name
			col.try_get::<Option<String>, _>("name").map(|n| n.unwrap_or_default().into())
		}))?;

		indexes.push(IndexInfo { name: name.into(), fields, unique });
	}

	Ok(indexes)
}

/// True if a unique index covers exactly the `key` column
///
/// `ON CONFLICT(key)` only matches such an index; a composite unique index
/// starting with `key` does not count.
pub(crate) async fn has_unique_key_index(db: &SqlitePool) -> ClResult<bool> {
	Ok(list(db).await?.iter().any(|index| index.is_unique_on("key")))
}

pub(crate) async fn drop(db: &SqlitePool, name: &str) -> ClResult<()> {
	sqlx::query(&format!("DROP INDEX IF EXISTS {}", quote_ident(name)))
		.execute(db)
		.await
		.map_err(db_err)?;

	Ok(())
}

pub(crate) async fn create(db: &SqlitePool, field: &str, unique: bool) -> ClResult<()> {
	if !SETTINGS_COLUMNS.contains(&field) {
		return Err(Error::ConfigError(format!("Cannot index unknown settings field '{}'", field)));
	}

	let sql = if unique {
		format!("CREATE UNIQUE INDEX IF NOT EXISTS idx_settings_{0}_unique ON settings({0})", field)
	} else {
		format!("CREATE INDEX IF NOT EXISTS idx_settings_{0} ON settings({0})", field)
	};
	sqlx::query(&sql).execute(db).await.map_err(db_err)?;

	Ok(())
}

/// Keys stored more than once, with every id holding them
pub(crate) async fn list_duplicates(db: &SqlitePool) -> ClResult<Vec<DuplicateGroup>> {
	let rows = sqlx::query(
		"SELECT key, group_concat(id) AS ids, count(*) AS count
		FROM settings GROUP BY key HAVING count(*) > 1",
	)
	.fetch_all(db)
	.await
	.map_err(db_err)?;

	let mut duplicates = Vec::with_capacity(rows.len());
	for row in rows {
		let key: String = row.try_get("key").map_err(db_err)?;
		let ids: String = row.try_get("ids").map_err(db_err)?;
		let count: i64 = row.try_get("count").map_err(db_err)?;

		duplicates.push(DuplicateGroup {
			key: key.into(),
			ids: parse_id_list(&ids)?,
			count: usize::try_from(count).map_err(|_| Error::DbError)?,
		});
	}

	Ok(duplicates)
}

// vim: ts=4
