use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use cairn_core::CoreDeps;
use cairn_core::entity::MetaEntityLookup;
use cairn_core::plugin::PluginCatalog;
use cairn_core::request::{FixedRequestContext, NoRequestContext, RequestContext, RequestInfo};
use cairn_core::settings::{SettingsRegistry, SettingsService};
use cairn_meta_adapter_sqlite::MetaAdapterSqlite;
use cairn_types::meta_adapter::MetaAdapter;
use cairn_types::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "cairn", version, about = "Cairn settings store")]
pub struct Config {
	/// Directory holding the database files
	#[arg(long, env = "DB_DIR", default_value = "./data")]
	pub db_dir: PathBuf,

	/// Public origin used for request dependent defaults
	#[arg(long, env = "PUBLIC_URL")]
	pub public_url: Option<String>,

	/// Installed plugin with its dependencies, as NAME=DEP1,DEP2
	#[arg(long = "plugin", value_name = "NAME=DEPS", value_parser = parse_plugin)]
	pub plugins: Vec<(String, Vec<String>)>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Repair the unique key index and exit
	Repair,
	/// Print the effective value of a key
	Get { key: String },
	/// Validate and store a value (JSON, or a bare string)
	Set { key: String, value: String },
	/// Remove a stored value
	Unset { key: String },
	/// Print stored settings
	List { prefix: Option<String> },
}

fn parse_plugin(s: &str) -> Result<(String, Vec<String>), String> {
	let (name, deps) = s.split_once('=').unwrap_or((s, ""));
	let name = name.trim();
	if name.is_empty() {
		return Err(format!("missing plugin name in '{}'", s));
	}
	let deps = deps
		.split(',')
		.map(str::trim)
		.filter(|dep| !dep.is_empty())
		.map(ToString::to_string)
		.collect();
	Ok((name.to_string(), deps))
}

fn parse_value(s: &str) -> Value {
	serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}

async fn bootstrap(config: &Config) -> ClResult<SettingsService> {
	let meta: Arc<dyn MetaAdapter> = Arc::new(MetaAdapterSqlite::new(&config.db_dir).await?);

	let mut catalog = PluginCatalog::new();
	for (name, deps) in &config.plugins {
		let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
		catalog.add(name.as_str(), &deps);
	}

	let request: Arc<dyn RequestContext> = match &config.public_url {
		Some(url) => Arc::new(FixedRequestContext(RequestInfo::parse(url)?)),
		None => Arc::new(NoRequestContext),
	};

	let deps = Arc::new(CoreDeps {
		plugins: Arc::new(catalog),
		entities: Arc::new(MetaEntityLookup::new(meta.clone())),
		request,
	});

	let mut registry = SettingsRegistry::new();
	cairn_core::register_settings(&mut registry, deps)?;
	let registry = Arc::new(registry.freeze());
	info!("{} settings registered", registry.len());

	SettingsService::open(registry, meta).await
}

async fn run(config: Config) -> ClResult<()> {
	let service = bootstrap(&config).await?;

	match config.command {
		Command::Repair => {
			info!("Settings store repaired");
		}
		Command::Get { key } => {
			println!("{}", service.get(&key).await?);
		}
		Command::Set { key, value } => {
			let saved = service.set(&key, parse_value(&value)).await?;
			println!("{}", saved.value);
		}
		Command::Unset { key } => {
			service.unset(&key).await?;
		}
		Command::List { prefix } => {
			for setting in service.list(prefix.as_deref()).await? {
				println!("{}\t{}", setting.key, setting.value);
			}
		}
	}

	Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();

	let config = Config::parse();
	match run(config).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("{}", err);
			eprintln!("error: {}", err);
			ExitCode::FAILURE
		}
	}
}


// vim: ts=4
