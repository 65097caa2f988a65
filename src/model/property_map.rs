//! PropertyMap and neighbor filters.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use super::Value;

/// A map of property names to values.
pub type PropertyMap = HashMap<String, Value>;

/// Equality predicate on a neighbor property, e.g. `Playlist.public = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub key: String,
    pub value: Value,
}

impl PropertyFilter {
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    /// A missing property never matches.
    pub fn matches(&self, props: &PropertyMap) -> bool {
        props.get(&self.key) == Some(&self.value)
    }
}
