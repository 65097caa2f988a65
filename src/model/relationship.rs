//! Relationship types and traversal direction.

use std::fmt;

use serde::{Deserialize, Serialize};
use super::Label;

/// Traversal direction, relative to the node the traversal starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    pub fn reverse(self) -> Self {
        match self {
            Direction::Outgoing => Direction::Incoming,
            Direction::Incoming => Direction::Outgoing,
        }
    }
}

/// The relationship types the scoring core reads.
///
/// Each type has fixed endpoint labels, so `(start, rel, dir)` fully
/// determines what label the neighbors have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelType {
    /// User -> Genre
    LikesGenre,
    /// User -> Song
    Liked,
    /// User -> Playlist
    Follows,
    /// User -> Playlist
    Owns,
    /// Playlist -> Song
    Contains,
}

impl RelType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelType::LikesGenre => "LIKES_GENRE",
            RelType::Liked => "LIKED",
            RelType::Follows => "FOLLOWS",
            RelType::Owns => "OWNS",
            RelType::Contains => "CONTAINS",
        }
    }

    /// (source label, target label)
    pub fn endpoints(self) -> (Label, Label) {
        match self {
            RelType::LikesGenre => (Label::User, Label::Genre),
            RelType::Liked => (Label::User, Label::Song),
            RelType::Follows | RelType::Owns => (Label::User, Label::Playlist),
            RelType::Contains => (Label::Playlist, Label::Song),
        }
    }

    /// Label of the node a traversal in `dir` starts from.
    pub fn start_label(self, dir: Direction) -> Label {
        let (src, dst) = self.endpoints();
        match dir {
            Direction::Outgoing => src,
            Direction::Incoming => dst,
        }
    }

    /// Label of the neighbors reached by a traversal in `dir`.
    pub fn neighbor_label(self, dir: Direction) -> Label {
        self.start_label(dir.reverse())
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
