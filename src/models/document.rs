use serde::{Deserialize, Serialize};

use super::{DocumentId, TagId};

/// A document as returned by the documents endpoint.
///
/// Only the fields needed for usage analysis and re-tagging are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagId>,
}

impl Document {
    /// Returns true if the document already carries `tag`.
    pub fn has_tag(&self, tag: TagId) -> bool {
        self.tags.contains(&tag)
    }
}

/// One page of a paginated list response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Page of documents matching a tag query.
pub type DocumentPage = Page<Document>;
