//! Settings document storage
//!
//! Settings are stored one row per document with the value as JSON text.

use sqlx::{Row, SqlitePool};

use cairn::meta_adapter::{ListSettingOptions, Setting};
use cairn::prelude::*;

use crate::utils::{collect_res, db_err, setting_from_row};

/// Read the document for a key (the oldest one if duplicates exist)
pub(crate) async fn read(db: &SqlitePool, key: &str) -> ClResult<Option<Setting>> {
	let row = sqlx::query("SELECT id, key, value FROM settings WHERE key = ? ORDER BY id LIMIT 1")
		.bind(key)
		.fetch_optional(db)
		.await
		.map_err(db_err)?;

	row.as_ref().map(setting_from_row).transpose().map_err(db_err)
}

/// List documents matching the options
pub(crate) async fn list(db: &SqlitePool, opts: &ListSettingOptions) -> ClResult<Vec<Setting>> {
	let mut query = sqlx::QueryBuilder::new("SELECT id, key, value FROM settings WHERE 1=1");
	if let Some(key) = &opts.key {
		query.push(" AND key = ").push_bind(&**key);
	}
	if let Some(prefix) = &opts.prefix {
		query.push(" AND substr(key, 1, length(").push_bind(&**prefix);
		query.push(")) = ").push_bind(&**prefix);
	}
	query.push(" ORDER BY key, id");

	let rows = query.build().fetch_all(db).await.map_err(db_err)?;
	collect_res(rows.iter().map(setting_from_row))
}

/// Insert or update a document
///
/// `key_unique` tells whether a single-column unique index on `key` exists,
/// which `ON CONFLICT(key)` requires.
pub(crate) async fn save(db: &SqlitePool, setting: &Setting, key_unique: bool) -> ClResult<Setting> {
	let value_str = setting.value.to_string();

	let res = if let Some(id) = setting.id {
		sqlx::query(
			"INSERT INTO settings (id, key, value) VALUES (?, ?, ?)
			ON CONFLICT(id) DO UPDATE SET key = excluded.key, value = excluded.value
			RETURNING id",
		)
		.bind(id.0)
		.bind(&*setting.key)
		.bind(value_str.as_str())
		.fetch_one(db)
		.await
	} else if key_unique {
		// Concurrent first writers end up updating the same row
		sqlx::query(
			"INSERT INTO settings (key, value) VALUES (?, ?)
			ON CONFLICT(key) DO UPDATE SET value = excluded.value
			RETURNING id",
		)
		.bind(&*setting.key)
		.bind(value_str.as_str())
		.fetch_one(db)
		.await
	} else {
		sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?) RETURNING id")
			.bind(&*setting.key)
			.bind(value_str.as_str())
			.fetch_one(db)
			.await
	};

	let row = res.map_err(db_err)?;
	let id: i64 = row.try_get("id").map_err(db_err)?;
	Ok(Setting { id: Some(DocId(id)), key: setting.key.clone(), value: setting.value.clone() })
}

/// Delete one document
pub(crate) async fn remove(db: &SqlitePool, id: DocId) -> ClResult<()> {
	sqlx::query("DELETE FROM settings WHERE id = ?")
		.bind(id.0)
		.execute(db)
		.await
		.map_err(db_err)?;

	Ok(())
}

// vim: ts=4
