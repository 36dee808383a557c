mod document;
mod ids;
mod tag;

pub use document::{Document, DocumentPage, Page};
pub use ids::{DocumentId, TagId};
pub use tag::Tag;
