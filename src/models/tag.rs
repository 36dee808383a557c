use serde::{Deserialize, Serialize};

use super::TagId;

/// A tag as fetched from the document system.
///
/// Tags are read-only snapshots; the authoritative copy lives remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

impl Tag {
    /// Creates a new tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagdedup::{Tag, TagId};
    ///
    /// let tag = Tag::new(TagId::new(1), "Invoice");
    /// assert_eq!(tag.id, TagId::new(1));
    /// assert_eq!(tag.name, "Invoice");
    /// ```
    pub fn new(id: TagId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
