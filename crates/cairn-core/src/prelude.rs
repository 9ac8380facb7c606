pub use cairn_types::error::{ClResult, Error};
pub use cairn_types::types::{DocId, EntityId, EntityKind};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
