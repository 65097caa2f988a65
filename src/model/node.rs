//! Node in the music-social graph.

use std::fmt;

use serde::{Deserialize, Serialize};
use super::{PropertyMap, Value};

/// Node label. Every node carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    User,
    Genre,
    Song,
    Playlist,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::User => "User",
            Label::Genre => "Genre",
            Label::Song => "Song",
            Label::Playlist => "Playlist",
        }
    }

    /// Name of the identifying property (`name` for genres, `id` otherwise).
    pub fn key_property(self) -> &'static str {
        match self {
            Label::Genre => "name",
            _ => "id",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable node key. Unique within a label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(v: &str) -> Self { NodeId(v.to_owned()) }
}

impl From<String> for NodeId {
    fn from(v: String) -> Self { NodeId(v) }
}

/// A node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: Label,
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(label: Label, id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            label,
            properties: PropertyMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}
