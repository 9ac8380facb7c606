//! Shared utilities for SQLite adapter
//!
//! Error mapping and row decoding helpers used across the domain modules.

use cairn::meta_adapter::Setting;
use cairn::prelude::*;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Parse comma-separated id list as produced by `group_concat`
pub(crate) fn parse_id_list(s: &str) -> ClResult<Vec<DocId>> {
	s.split(',')
		.map(|id| id.trim().parse::<i64>().map(DocId).map_err(|_| Error::DbError))
		.collect()
}

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Log and translate a database error
pub(crate) fn db_err(err: sqlx::Error) -> Error {
	inspect(&err);
	Error::DbError
}

/// Decode a `settings` row; unparsable JSON reads as null
pub(crate) fn setting_from_row(row: &SqliteRow) -> Result<Setting, sqlx::Error> {
	let value: Option<String> = row.try_get("value")?;
	Ok(Setting {
		id: Some(DocId(row.try_get("id")?)),
		key: row.try_get::<String, _>("key")?.into(),
		value: value
			.and_then(|v| serde_json::from_str(&v).ok())
			.unwrap_or(serde_json::Value::Null),
	})
}

/// Collect an iterator of decode results, translating errors
pub(crate) fn collect_res<T>(
	iter: impl Iterator<Item = Result<T, sqlx::Error>>,
) -> ClResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}

/// Quote an SQL identifier
pub(crate) fn quote_ident(name: &str) -> String {
	format!("\"{}\"", name.replace('"', "\"\""))
}


// vim: ts=4
