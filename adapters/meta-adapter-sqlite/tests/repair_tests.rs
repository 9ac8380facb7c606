//! Key index repair against a real SQLite database
//!
//! Older databases may hold duplicate keys and a plain index on `key`; opening
//! the settings store has to leave exactly one document per key behind a
//! unique index.

use cairn::meta_adapter::{ListSettingOptions, MetaAdapter, Setting};
use cairn_core::settings::{SettingsRegistry, SettingsService};
use cairn_meta_adapter_sqlite::MetaAdapterSqlite;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

async fn create_test_adapter() -> (Arc<MetaAdapterSqlite>, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = MetaAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");

	(Arc::new(adapter), temp_dir)
}

async fn open_service(adapter: &Arc<MetaAdapterSqlite>) -> SettingsService {
	let registry = Arc::new(SettingsRegistry::new().freeze());
	SettingsService::open(registry, adapter.clone()).await.expect("Should open settings store")
}

async fn has_unique_key_index(adapter: &MetaAdapterSqlite) -> bool {
	adapter
		.list_setting_indexes()
		.await
		.expect("Should list indexes")
		.iter()
		.any(|index| index.is_unique_on("key"))
}

#[tokio::test]
async fn test_fresh_database_gets_unique_index() {
	let (adapter, _temp) = create_test_adapter().await;
	assert!(!has_unique_key_index(&adapter).await);

	open_service(&adapter).await;

	assert!(has_unique_key_index(&adapter).await);
}

#[tokio::test]
async fn test_duplicates_collapse_to_lowest_id() {
	let (adapter, _temp) = create_test_adapter().await;
	let first = adapter
		.save_setting(&Setting::new("core.smtp_host", json!("first.example.com")))
		.await
		.expect("Should save");
	for host in ["second.example.com", "third.example.com"] {
		adapter
			.save_setting(&Setting::new("core.smtp_host", json!(host)))
			.await
			.expect("Should save");
	}
	adapter.save_setting(&Setting::new("core.smtp_port", json!(25))).await.expect("Should save");
	assert_eq!(adapter.list_duplicate_settings().await.expect("duplicates")[0].count, 3);

	let service = open_service(&adapter).await;

	let opts = ListSettingOptions { key: Some("core.smtp_host".into()), prefix: None };
	let remaining = adapter.list_settings(&opts).await.expect("Should list");
	assert_eq!(remaining.len(), 1);
	assert_eq!(remaining[0].id, first.id);
	assert_eq!(service.get("core.smtp_host").await.expect("get"), json!("first.example.com"));
	assert_eq!(service.get("core.smtp_port").await.expect("get"), json!(25));
	assert!(adapter.list_duplicate_settings().await.expect("duplicates").is_empty());
}

#[tokio::test]
async fn test_plain_key_index_is_replaced() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.create_setting_index("key", false).await.expect("Should create index");
	adapter.create_setting_index("value", false).await.expect("Should create index");

	open_service(&adapter).await;

	let indexes = adapter.list_setting_indexes().await.expect("Should list indexes");
	assert!(indexes.iter().all(|index| &*index.name != "idx_settings_key"));
	assert!(indexes.iter().any(|index| &*index.name == "idx_settings_value"));
	assert!(has_unique_key_index(&adapter).await);
}

#[tokio::test]
async fn test_composite_unique_index_gets_key_index() {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	drop(MetaAdapterSqlite::new(temp_dir.path()).await.expect("adapter"));

	// Index left behind by an older schema
	let opts = sqlx::sqlite::SqliteConnectOptions::new().filename(temp_dir.path().join("meta.db"));
	let pool = sqlx::SqlitePool::connect_with(opts).await.expect("raw pool");
	sqlx::query("CREATE UNIQUE INDEX old_kv ON settings(key, value)")
		.execute(&pool)
		.await
		.expect("create composite index");
	pool.close().await;

	let adapter = Arc::new(MetaAdapterSqlite::new(temp_dir.path()).await.expect("adapter"));
	assert!(!has_unique_key_index(&adapter).await);

	// Before repair a first write falls back to a plain insert
	adapter.save_setting(&Setting::new("k", json!(1))).await.expect("Should save");

	let service = open_service(&adapter).await;
	assert!(has_unique_key_index(&adapter).await);
	let indexes = adapter.list_setting_indexes().await.expect("Should list indexes");
	assert!(indexes.iter().any(|index| &*index.name == "old_kv"));

	// After repair writes to an existing key update it in place
	adapter.save_setting(&Setting::new("k", json!(2))).await.expect("Should save");
	adapter.save_setting(&Setting::new("j", json!(1))).await.expect("Should save");
	let opts = ListSettingOptions { key: Some("k".into()), prefix: None };
	assert_eq!(adapter.list_settings(&opts).await.expect("Should list").len(), 1);
	assert_eq!(service.get("k").await.expect("get"), json!(2));
}

#[tokio::test]
async fn test_dropping_unique_index_stops_upserts() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.create_setting_index("key", true).await.expect("Should create index");
	adapter.save_setting(&Setting::new("k", json!(1))).await.expect("Should save");
	adapter.save_setting(&Setting::new("k", json!(2))).await.expect("Should save");
	assert_eq!(adapter.list_settings(&ListSettingOptions::default()).await.expect("list").len(), 1);

	adapter.drop_setting_index("idx_settings_key_unique").await.expect("Should drop index");
	adapter.save_setting(&Setting::new("k", json!(3))).await.expect("Should save");

	assert_eq!(adapter.list_settings(&ListSettingOptions::default()).await.expect("list").len(), 2);
}

#[tokio::test]
async fn test_repeated_open_is_stable() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.save_setting(&Setting::new("k", json!(1))).await.expect("Should save");

	open_service(&adapter).await;
	let before = adapter.list_setting_indexes().await.expect("Should list indexes");
	open_service(&adapter).await;
	let after = adapter.list_setting_indexes().await.expect("Should list indexes");

	assert_eq!(before, after);
	assert_eq!(adapter.list_settings(&ListSettingOptions::default()).await.expect("list").len(), 1);
}

#[tokio::test]
async fn test_index_on_unknown_field_is_rejected() {
	let (adapter, _temp) = create_test_adapter().await;

	assert!(adapter.create_setting_index("id; DROP TABLE settings", true).await.is_err());
}

#[tokio::test]
async fn test_concurrent_first_writes_after_repair() {
	let (adapter, _temp) = create_test_adapter().await;
	open_service(&adapter).await;

	let mut handles = Vec::new();
	for i in 0..8 {
		let adapter = adapter.clone();
		handles.push(tokio::spawn(async move {
			adapter.save_setting(&Setting::new("core.cookie_lifetime", json!(i))).await
		}));
	}
	for handle in handles {
		handle.await.expect("task").expect("Should save");
	}

	let opts = ListSettingOptions { key: Some("core.cookie_lifetime".into()), prefix: None };
	assert_eq!(adapter.list_settings(&opts).await.expect("Should list").len(), 1);
}

// vim: ts=4
