//! Executing an accepted merge suggestion against the document system.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::suggestion::{ConsolidationSuggestion, TagUsage};
use crate::models::{DocumentId, TagId};
use crate::paperless::{DocumentQuery, PaperlessApi, PaperlessError};

/// Documents fetched per secondary tag. Only this first page is re-tagged.
pub const CONSOLIDATION_PAGE_SIZE: u32 = 100;

/// A suggestion that can't be executed at all.
#[derive(Debug, Error)]
pub enum ConsolidationError {
    #[error("Invalid suggestion: {0}")]
    InvalidSuggestion(String),
}

/// One failure recorded while consolidating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConsolidationFailure {
    /// Re-tagging a document failed.
    Document {
        #[serde(rename = "documentId")]
        document_id: DocumentId,
        error: String,
    },
    /// Deleting a secondary tag failed.
    Tag {
        #[serde(rename = "tagId")]
        tag_id: TagId,
        error: String,
    },
    /// The run stopped before finishing, e.g. a document fetch failed.
    Run { error: String },
}

impl ConsolidationFailure {
    pub fn message(&self) -> &str {
        match self {
            Self::Document { error, .. } | Self::Tag { error, .. } | Self::Run { error } => error,
        }
    }
}

/// Outcome of a consolidation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationResult {
    /// True when no failure of any kind was recorded.
    pub success: bool,
    pub documents_updated: u64,
    pub errors: Vec<ConsolidationFailure>,
    /// Secondary tags that were deleted.
    #[serde(default)]
    pub deleted_tags: Vec<TagId>,
    /// Documents left untouched because their tag had more than one page.
    #[serde(default)]
    pub unprocessed_documents: u64,
}

/// Merges the secondary tags of `suggestion` into its primary tag.
///
/// 1. For each secondary tag, the first [`CONSOLIDATION_PAGE_SIZE`] documents
///    carrying it get the primary tag added, unless they already have it.
/// 2. Only when every re-tag succeeded are the secondary tags deleted.
///
/// Per-document and per-tag failures are recorded and processing continues. A
/// failed document fetch stops the run and no tag is deleted. Nothing is retried
/// and nothing is rolled back.
///
/// # Errors
///
/// Returns `ConsolidationError::InvalidSuggestion` before touching the API when
/// there are no secondary tags, a secondary tag is listed twice, or the primary
/// also appears as a secondary.
pub fn consolidate(
    api: &dyn PaperlessApi,
    suggestion: &ConsolidationSuggestion,
) -> Result<ConsolidationResult, ConsolidationError> {
    validate(suggestion)?;

    let primary = &suggestion.primary_tag;
    info!(
        primary = %primary.id,
        name = %primary.name,
        secondary = suggestion.secondary_tags.len(),
        "consolidating tags"
    );

    let mut result = ConsolidationResult::default();

    match retag_documents(api, suggestion, &mut result) {
        Err(e) => {
            warn!(error = %e, "consolidation aborted; no tags deleted");
            result.errors.push(ConsolidationFailure::Run {
                error: e.to_string(),
            });
        }
        Ok(()) if !result.errors.is_empty() => {
            warn!(
                failures = result.errors.len(),
                "re-tagging had failures; keeping secondary tags"
            );
        }
        Ok(()) => delete_secondary_tags(api, &suggestion.secondary_tags, &mut result),
    }

    result.success = result.errors.is_empty();
    info!(
        success = result.success,
        documents_updated = result.documents_updated,
        deleted = result.deleted_tags.len(),
        unprocessed = result.unprocessed_documents,
        "consolidation finished"
    );

    Ok(result)
}

fn validate(suggestion: &ConsolidationSuggestion) -> Result<(), ConsolidationError> {
    if suggestion.secondary_tags.is_empty() {
        return Err(ConsolidationError::InvalidSuggestion(
            "no secondary tags to merge".to_string(),
        ));
    }

    let primary = suggestion.primary_tag.id;
    if suggestion.secondary_tags.iter().any(|t| t.id == primary) {
        return Err(ConsolidationError::InvalidSuggestion(format!(
            "primary tag {} is also listed as a secondary tag",
            primary
        )));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = suggestion.secondary_tags.iter().find(|t| !seen.insert(t.id)) {
        return Err(ConsolidationError::InvalidSuggestion(format!(
            "secondary tag {} is listed more than once",
            dup.id
        )));
    }

    Ok(())
}

/// Adds the primary tag to every document carrying a secondary tag.
///
/// Returns `Err` only when a document fetch fails.
fn retag_documents(
    api: &dyn PaperlessApi,
    suggestion: &ConsolidationSuggestion,
    result: &mut ConsolidationResult,
) -> Result<(), PaperlessError> {
    let primary = suggestion.primary_tag.id;

    for secondary in &suggestion.secondary_tags {
        let query = DocumentQuery::first_page(CONSOLIDATION_PAGE_SIZE);
        let page = api.documents_with_tag(secondary.id, query)?;

        let fetched = page.results.len() as u64;
        if page.count > fetched {
            result.unprocessed_documents += page.count - fetched;
            warn!(
                tag = %secondary.id,
                name = %secondary.name,
                total = page.count,
                unprocessed = page.count - fetched,
                "tag has more documents than one page; only the first page is re-tagged"
            );
        }

        for document in page.results {
            if document.has_tag(primary) {
                continue;
            }

            let mut tags = document.tags;
            tags.push(primary);

            match api.update_document_tags(document.id, &tags) {
                Ok(()) => result.documents_updated += 1,
                Err(e) => {
                    warn!(document = %document.id, error = %e, "re-tagging failed");
                    result.errors.push(ConsolidationFailure::Document {
                        document_id: document.id,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    Ok(())
}

fn delete_secondary_tags(
    api: &dyn PaperlessApi,
    secondary_tags: &[TagUsage],
    result: &mut ConsolidationResult,
) {
    for tag in secondary_tags {
        match api.delete_tag(tag.id) {
            Ok(()) => {
                info!(tag = %tag.id, name = %tag.name, "deleted tag");
                result.deleted_tags.push(tag.id);
            }
            Err(e) => {
                warn!(tag = %tag.id, error = %e, "tag deletion failed");
                result.errors.push(ConsolidationFailure::Tag {
                    tag_id: tag.id,
                    error: e.to_string(),
                });
            }
        }
    }
}
