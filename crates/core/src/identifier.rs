//! Composite identifiers: an optional external id plus a UUID.
//!
//! Text form is `externalId_uuid`, or the bare `uuid` when no external id is
//! set. The same form is used for path segments, query parameters and JSON
//! strings, so binding and serialization always agree.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier with an optional free-text external id and a mandatory UUID.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct CompositeIdentifier {
    external_id: Option<String>,
    id: Uuid,
}

impl CompositeIdentifier {
    /// Create an identifier from its parts.
    pub fn new(external_id: Option<String>, id: Uuid) -> Self {
        Self { external_id, id }
    }

    /// Generate a fresh identifier with a random UUID.
    pub fn generate(external_id: Option<String>) -> Self {
        Self::new(external_id, Uuid::new_v4())
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    /// Parse the text form.
    ///
    /// The text is split at its last underscore: the tail must be a UUID and
    /// everything before it is the external id, which may itself contain
    /// underscores. Text without an underscore must be a bare UUID.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let invalid = || crate::Error::InvalidIdentifier(text.to_string());
        match text.rsplit_once('_') {
            Some((external_id, uuid)) => {
                let id = Uuid::parse_str(uuid).map_err(|_| invalid())?;
                Ok(Self::new(Some(external_id.to_string()), id))
            }
            None => {
                let id = Uuid::parse_str(text).map_err(|_| invalid())?;
                Ok(Self::new(None, id))
            }
        }
    }

    /// Render the text form.
    pub fn format(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CompositeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.external_id {
            Some(external_id) => write!(f, "{external_id}_{}", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

impl FromStr for CompositeIdentifier {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for CompositeIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompositeIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
