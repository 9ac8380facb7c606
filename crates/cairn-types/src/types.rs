//! Identity types used by the settings store and its collaborators.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prelude::*;

// DocId //
//*******//
/// Storage-assigned identity of a setting document
///
/// Assigned by the meta adapter on first save. Ordered by creation, which the
/// index repair relies on when it picks the document to keep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(pub i64);

impl std::fmt::Display for DocId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for DocId {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

impl<'de> Deserialize<'de> for DocId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Ok(DocId(i64::deserialize(deserializer)?))
	}
}

// EntityId //
//**********//
pub const ENTITY_ID_LENGTH: usize = 24;

/// Canonical identity of a referenced user or group: 24 lowercase hex digits
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityId(Box<str>);

impl EntityId {
	/// Parse an id from its string form, normalizing case and whitespace
	pub fn parse(s: &str) -> ClResult<Self> {
		let s = s.trim();
		if s.len() != ENTITY_ID_LENGTH || !s.chars().all(|c| c.is_ascii_hexdigit()) {
			return Err(Error::invalid_field("id", format!("Invalid ObjectId: {}", s)));
		}
		Ok(EntityId(s.to_ascii_lowercase().into()))
	}

	/// Parse an id from a JSON value: a plain string or `{"$oid": "..."}`
	pub fn from_value(value: &Value) -> ClResult<Self> {
		match value {
			Value::String(s) => Self::parse(s),
			Value::Object(obj) => match obj.get("$oid") {
				Some(Value::String(s)) => Self::parse(s),
				_ => Err(Error::invalid_field("id", format!("Invalid ObjectId: {}", value))),
			},
			_ => Err(Error::invalid_field("id", format!("Invalid ObjectId: {}", value))),
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for EntityId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl Serialize for EntityId {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for EntityId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		EntityId::parse(&s).map_err(serde::de::Error::custom)
	}
}

// EntityKind //
//************//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
	#[serde(rename = "user")]
	User,
	#[serde(rename = "group")]
	Group,
}

impl EntityKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			EntityKind::User => "user",
			EntityKind::Group => "group",
		}
	}
}

impl std::str::FromStr for EntityKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"user" => Ok(EntityKind::User),
			"group" => Ok(EntityKind::Group),
			_ => Err(Error::DbError),
		}
	}
}

impl std::fmt::Display for EntityKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}


// vim: ts=4
