//! Database schema initialization
//!
//! Creates the tables the adapter works on. The settings table deliberately has
//! no index on `key`: the uniqueness index is owned by the settings store's
//! repair step, which also has to cope with databases created before it.

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Settings
	//**********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS settings (
		id integer PRIMARY KEY AUTOINCREMENT,
		key text NOT NULL,
		value text
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Entities
	//**********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS entities (
		kind text NOT NULL,
		id text NOT NULL,
		name text NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		PRIMARY KEY(kind, id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

// vim: ts=4
