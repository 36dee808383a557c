//! Tag deduplication: grouping near-duplicate names, measuring usage, proposing
//! merges and carrying them out.
//!
//! The pipeline runs leaf-first:
//!
//! 1. [`group_similar_tags`] clusters tags whose lower-cased names are similar.
//! 2. [`analyze_usage`] counts documents per tag and finds the latest use.
//! 3. [`generate_suggestions`] picks a primary tag per group and scores it.
//! 4. [`consolidate`] moves documents onto the primary and deletes the rest.
//!
//! # Examples
//!
//! ```
//! use tagdedup::dedup::{generate_suggestions, group_similar_tags, UsageMap};
//! use tagdedup::{Tag, TagId};
//!
//! let tags = vec![
//!     Tag::new(TagId::new(1), "Invoice"),
//!     Tag::new(TagId::new(2), "invoice"),
//!     Tag::new(TagId::new(3), "Receipt"),
//! ];
//!
//! let groups = group_similar_tags(&tags, 0.8);
//! assert_eq!(groups.len(), 1);
//!
//! let suggestions = generate_suggestions(&groups, &UsageMap::new());
//! assert_eq!(suggestions[0].primary_tag.id, TagId::new(1));
//! ```

mod consolidator;
mod grouper;
mod similarity;
mod suggestion;
mod usage;

pub use consolidator::{
    CONSOLIDATION_PAGE_SIZE, ConsolidationError, ConsolidationFailure, ConsolidationResult,
    consolidate,
};
pub use grouper::{SimilarityGroup, group_by, group_similar_tags};
pub use similarity::{name_similarity, normalize_name};
pub use suggestion::{
    ConsolidationSuggestion, SIMILAR_NAMES_REASON, TagUsage, build_suggestion, confidence_score,
    generate_suggestions,
};
pub use usage::{UsageMap, UsageRecord, analyze_usage, lookup_usage};
