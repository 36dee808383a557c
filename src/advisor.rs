//! Service layer tying the deduplication pipeline to a document system.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use tagdedup::TagAdvisorBuilder;
//! use tagdedup::paperless::PaperlessClientBuilder;
//!
//! # fn example() -> anyhow::Result<()> {
//! let client = PaperlessClientBuilder::new()
//!     .base_url("http://localhost:8000")
//!     .token("secret")
//!     .build()?;
//!
//! let advisor = TagAdvisorBuilder::new(Arc::new(client))
//!     .threshold(0.85)
//!     .build();
//!
//! let report = advisor.analyze_tags()?;
//! if let Some(best) = report.suggestions.first() {
//!     let result = advisor.consolidate_tags(best)?;
//!     println!("updated {} documents", result.documents_updated);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::config::DEFAULT_SIMILARITY_THRESHOLD;
use crate::dedup::{
    ConsolidationResult, ConsolidationSuggestion, SimilarityGroup, UsageMap, analyze_usage,
    consolidate, generate_suggestions, group_similar_tags,
};
use crate::paperless::PaperlessApi;

/// Everything one analysis run found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// RFC 3339 time the analysis finished.
    pub generated_at: String,
    pub threshold: f64,
    pub similar_groups: Vec<SimilarityGroup>,
    pub usage_analysis: UsageMap,
    pub suggestions: Vec<ConsolidationSuggestion>,
}

/// Builder for constructing `TagAdvisor` instances.
pub struct TagAdvisorBuilder {
    client: Arc<dyn PaperlessApi>,
    threshold: f64,
}

impl TagAdvisorBuilder {
    /// Starts a builder around `client` with the default threshold.
    pub fn new(client: Arc<dyn PaperlessApi>) -> Self {
        Self {
            client,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Sets the minimum name similarity for grouping, clamped to [0, 1].
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn build(self) -> TagAdvisor {
        TagAdvisor {
            client: self.client,
            threshold: self.threshold,
        }
    }
}

/// Analyzes tags for duplicates and executes accepted merges.
///
/// Holds no state between calls: every analysis re-fetches tags and usage.
pub struct TagAdvisor {
    client: Arc<dyn PaperlessApi>,
    threshold: f64,
}

impl TagAdvisor {
    /// Creates an advisor with the default similarity threshold.
    #[must_use]
    pub fn new(client: Arc<dyn PaperlessApi>) -> Self {
        TagAdvisorBuilder::new(client).build()
    }

    /// Returns the similarity threshold used for grouping.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Fetches all tags, groups similar names, looks up usage and builds suggestions.
    ///
    /// # Errors
    ///
    /// Fails only if the tag list can't be fetched. Per-tag usage failures are
    /// reported inside `usage_analysis`.
    pub fn analyze_tags(&self) -> Result<AnalysisReport> {
        let tags = self.client.list_tags().context("Failed to fetch tags")?;
        info!(tags = tags.len(), threshold = self.threshold, "fetched tags");

        let similar_groups = group_similar_tags(&tags, self.threshold);
        info!(groups = similar_groups.len(), "grouped similar tag names");

        let usage_analysis = analyze_usage(self.client.as_ref(), &tags);
        let suggestions = generate_suggestions(&similar_groups, &usage_analysis);

        let generated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("Failed to format report timestamp")?;

        Ok(AnalysisReport {
            generated_at,
            threshold: self.threshold,
            similar_groups,
            usage_analysis,
            suggestions,
        })
    }

    /// Merges the secondary tags of `suggestion` into its primary tag.
    ///
    /// # Errors
    ///
    /// Fails when the suggestion is malformed. API failures during the run are
    /// reported in the returned `ConsolidationResult`.
    pub fn consolidate_tags(
        &self,
        suggestion: &ConsolidationSuggestion,
    ) -> Result<ConsolidationResult> {
        consolidate(self.client.as_ref(), suggestion).context("Failed to consolidate tags")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentId, DocumentPage, Tag, TagId};
    use crate::paperless::{DocumentQuery, PaperlessError};

    struct Unreachable;

    impl PaperlessApi for Unreachable {
        fn list_tags(&self) -> Result<Vec<Tag>, PaperlessError> {
            Err(PaperlessError::InvalidUrl("offline".to_string()))
        }

        fn documents_with_tag(
            &self,
            _tag: TagId,
            _query: DocumentQuery,
        ) -> Result<DocumentPage, PaperlessError> {
            unreachable!()
        }

        fn update_document_tags(
            &self,
            _document: DocumentId,
            _tags: &[TagId],
        ) -> Result<(), PaperlessError> {
            unreachable!()
        }

        fn delete_tag(&self, _tag: TagId) -> Result<(), PaperlessError> {
            unreachable!()
        }
    }

    #[test]
    fn builder_defaults_and_clamps_threshold() {
        assert_eq!(
            TagAdvisor::new(Arc::new(Unreachable)).threshold(),
            DEFAULT_SIMILARITY_THRESHOLD
        );
        assert_eq!(
            TagAdvisorBuilder::new(Arc::new(Unreachable))
                .threshold(1.7)
                .build()
                .threshold(),
            1.0
        );
    }

    #[test]
    fn tag_fetch_failure_fails_the_analysis() {
        let advisor = TagAdvisor::new(Arc::new(Unreachable));
        let err = advisor.analyze_tags().unwrap_err();

        assert!(err.to_string().contains("Failed to fetch tags"));
        assert!(format!("{err:#}").contains("offline"));
    }
}
