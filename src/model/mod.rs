//! # Music-Social Graph Model
//!
//! DTOs shared by the store, the feature extractor and the public API.
//!
//! Design rule: this module is pure data. No I/O, no state, no async.
//!
//! ```text
//! (:User)-[:LIKES_GENRE]->(:Genre)
//! (:User)-[:LIKED]->(:Song)
//! (:User)-[:FOLLOWS]->(:Playlist {public})
//! (:User)-[:OWNS]->(:Playlist)-[:CONTAINS]->(:Song)
//! ```

pub mod node;
pub mod relationship;
pub mod value;
pub mod property_map;
pub mod user;

pub use node::{Label, Node, NodeId};
pub use relationship::{Direction, RelType};
pub use value::Value;
pub use property_map::{PropertyFilter, PropertyMap};
pub use user::UserProfile;
