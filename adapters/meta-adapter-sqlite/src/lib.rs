//! SQLite implementation of the Cairn meta adapter
//!
//! Stores setting documents and the users and groups they reference in a
//! single `meta.db` file under the configured directory.

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use cairn::meta_adapter::{
	self, DuplicateGroup, Entity, IndexInfo, ListSettingOptions, Setting,
};
use cairn::prelude::*;

mod entity;
mod index;
mod schema;
mod setting;
mod utils;

use crate::utils::inspect;

#[derive(Debug)]
pub struct MetaAdapterSqlite {
	db: SqlitePool,
	/// Cached result of `index::has_unique_key_index`, refreshed on index changes
	key_unique: AtomicBool,
}

impl MetaAdapterSqlite {
	/// Open (or create) the database in `dir`
	pub async fn new(dir: impl AsRef<Path>) -> ClResult<Self> {
		let dir = dir.as_ref();
		tokio::fs::create_dir_all(dir).await?;

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(dir.join("meta.db"))
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;

		schema::init_db(&db).await.inspect_err(inspect).or(Err(Error::DbError))?;
		let key_unique = index::has_unique_key_index(&db).await?;
		debug!("meta adapter opened at {} (unique key index: {})", dir.display(), key_unique);

		Ok(Self { db, key_unique: AtomicBool::new(key_unique) })
	}

	async fn refresh_key_unique(&self) -> ClResult<()> {
		let key_unique = index::has_unique_key_index(&self.db).await?;
		self.key_unique.store(key_unique, Ordering::Release);
		Ok(())
	}
}

#[async_trait]
impl meta_adapter::MetaAdapter for MetaAdapterSqlite {
	// Settings
	//**********
	async fn find_setting(&self, key: &str) -> ClResult<Option<Setting>> {
		setting::read(&self.db, key).await
	}

	async fn list_settings(&self, opts: &ListSettingOptions) -> ClResult<Vec<Setting>> {
		setting::list(&self.db, opts).await
	}

	async fn save_setting(&self, setting: &Setting) -> ClResult<Setting> {
		setting::save(&self.db, setting, self.key_unique.load(Ordering::Acquire)).await
	}

	async fn remove_setting(&self, id: DocId) -> ClResult<()> {
		setting::remove(&self.db, id).await
	}

	// Index management
	//******************
	async fn list_setting_indexes(&self) -> ClResult<Vec<IndexInfo>> {
		index::list(&self.db).await
	}

	async fn drop_setting_index(&self, name: &str) -> ClResult<()> {
		index::drop(&self.db, name).await?;
		self.refresh_key_unique().await
	}

	async fn create_setting_index(&self, field: &str, unique: bool) -> ClResult<()> {
		index::create(&self.db, field, unique).await?;
		self.refresh_key_unique().await
	}

	async fn list_duplicate_settings(&self) -> ClResult<Vec<DuplicateGroup>> {
		index::list_duplicates(&self.db).await
	}

	// Entities
	//**********
	async fn read_entity(&self, kind: EntityKind, id: &EntityId) -> ClResult<Option<Entity>> {
		entity::read(&self.db, kind, id).await
	}

	async fn create_entity(&self, entity: &Entity) -> ClResult<()> {
		entity::create(&self.db, entity).await
	}
}

// vim: ts=4
