pub mod advisor;
pub mod config;
pub mod dedup;
pub mod models;
pub mod paperless;
pub mod report;

pub use advisor::{AnalysisReport, TagAdvisor, TagAdvisorBuilder};
pub use config::{Config, ConfigError};
pub use models::{Document, DocumentId, DocumentPage, Tag, TagId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_accessible_from_crate_root() {
        let tag = Tag::new(TagId::new(1), "Invoice");
        assert_eq!(tag.name, "Invoice");

        let document = Document {
            id: DocumentId::new(100),
            created: None,
            tags: vec![tag.id],
        };
        assert!(document.has_tag(TagId::new(1)));
    }

    #[test]
    fn pipeline_accessible_from_crate_root() {
        let tags = vec![
            Tag::new(TagId::new(1), "Invoice"),
            Tag::new(TagId::new(2), "invoice"),
        ];
        let groups = dedup::group_similar_tags(&tags, config::DEFAULT_SIMILARITY_THRESHOLD);
        let suggestions = dedup::generate_suggestions(&groups, &dedup::UsageMap::new());

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].reason, dedup::SIMILAR_NAMES_REASON);
    }
}
