//! Lookup of users and groups referenced by setting values

use async_trait::async_trait;
use std::sync::Arc;

use cairn_types::meta_adapter::{Entity, MetaAdapter};

use crate::prelude::*;

#[async_trait]
pub trait EntityLookup: Send + Sync {
	/// Load an entity by id
	///
	/// `force` skips access checks. With `exc` set a missing entity is an
	/// error instead of `None`.
	async fn load(
		&self,
		kind: EntityKind,
		id: &EntityId,
		force: bool,
		exc: bool,
	) -> ClResult<Option<Entity>>;
}

/// Entity lookup backed by the meta adapter
#[derive(Debug)]
pub struct MetaEntityLookup {
	meta: Arc<dyn MetaAdapter>,
}

impl MetaEntityLookup {
	pub fn new(meta: Arc<dyn MetaAdapter>) -> Self {
		Self { meta }
	}
}

#[async_trait]
impl EntityLookup for MetaEntityLookup {
	async fn load(
		&self,
		kind: EntityKind,
		id: &EntityId,
		_force: bool,
		exc: bool,
	) -> ClResult<Option<Entity>> {
		// Settings have no per-user access control, so `force` changes nothing here
		match self.meta.read_entity(kind, id).await? {
			Some(entity) => Ok(Some(entity)),
			None if exc => Err(Error::invalid_field("id", format!("No such {}: {}", kind, id))),
			None => Ok(None),
		}
	}
}

// vim: ts=4
