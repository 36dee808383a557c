//! Turning similarity groups into ranked merge suggestions.

use serde::{Deserialize, Serialize};

use super::grouper::SimilarityGroup;
use super::similarity::name_similarity;
use super::usage::UsageMap;
use crate::models::TagId;

/// Fixed reason attached to every name-based suggestion.
pub const SIMILAR_NAMES_REASON: &str = "Similar names";

const SIMILARITY_WEIGHT: f64 = 0.7;
const USAGE_WEIGHT: f64 = 0.3;

/// A tag together with the number of documents using it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagUsage {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub document_count: u64,
}

/// A proposal to merge `secondary_tags` into `primary_tag`.
///
/// The primary is the most-used member of its group. `confidence` blends name
/// similarity with how concentrated usage already is on the primary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationSuggestion {
    pub primary_tag: TagUsage,
    pub secondary_tags: Vec<TagUsage>,
    pub reason: String,
    pub confidence: f64,
}

impl ConsolidationSuggestion {
    /// Total documents across the primary and secondary tags.
    pub fn total_documents(&self) -> u64 {
        self.primary_tag.document_count
            + self
                .secondary_tags
                .iter()
                .map(|t| t.document_count)
                .sum::<u64>()
    }
}

/// Builds one suggestion per group, in group order.
///
/// # Examples
///
/// ```
/// use tagdedup::dedup::{generate_suggestions, SimilarityGroup, UsageMap, UsageRecord};
/// use tagdedup::{Tag, TagId};
///
/// let group = SimilarityGroup::new(vec![
///     Tag::new(TagId::new(1), "Invoice"),
///     Tag::new(TagId::new(2), "invoice"),
/// ]);
/// let mut usage = UsageMap::new();
/// usage.insert(TagId::new(1), UsageRecord { document_count: 5, ..Default::default() });
/// usage.insert(TagId::new(2), UsageRecord { document_count: 12, ..Default::default() });
///
/// let suggestions = generate_suggestions(&[group], &usage);
/// assert_eq!(suggestions[0].primary_tag.id, TagId::new(2));
/// assert_eq!(suggestions[0].secondary_tags[0].id, TagId::new(1));
/// ```
#[must_use]
pub fn generate_suggestions(
    groups: &[SimilarityGroup],
    usage: &UsageMap,
) -> Vec<ConsolidationSuggestion> {
    groups
        .iter()
        .filter_map(|group| build_suggestion(group, usage))
        .collect()
}

/// Ranks a group by document count and scores it.
///
/// Members are stable-sorted by descending document count, so ties keep their
/// grouping order. Tags absent from `usage` count as unused. Returns `None` for
/// an empty group.
pub fn build_suggestion(
    group: &SimilarityGroup,
    usage: &UsageMap,
) -> Option<ConsolidationSuggestion> {
    let mut ranked: Vec<TagUsage> = group
        .tags()
        .iter()
        .map(|tag| TagUsage {
            id: tag.id,
            name: tag.name.clone(),
            document_count: usage.get(&tag.id).map_or(0, |r| r.document_count),
        })
        .collect();

    ranked.sort_by(|a, b| b.document_count.cmp(&a.document_count));
    let confidence = confidence_score(&ranked);

    let mut members = ranked.into_iter();
    let primary_tag = members.next()?;

    Some(ConsolidationSuggestion {
        primary_tag,
        secondary_tags: members.collect(),
        reason: SIMILAR_NAMES_REASON.to_string(),
        confidence,
    })
}

/// Scores a ranked group whose first member is the primary tag.
///
/// `0.7 * mean pairwise name similarity + 0.3 * primary share of usage`, where the
/// mean covers every pair of members and the share is 0 when nothing is used.
/// Groups with fewer than two members score 0.
#[must_use]
pub fn confidence_score(ranked: &[TagUsage]) -> f64 {
    if ranked.len() < 2 {
        return 0.0;
    }

    let mut total_similarity = 0.0;
    let mut pairs = 0usize;
    for (i, a) in ranked.iter().enumerate() {
        for b in &ranked[i + 1..] {
            total_similarity += name_similarity(&a.name, &b.name);
            pairs += 1;
        }
    }
    let average_similarity = total_similarity / pairs as f64;

    let total_usage: u64 = ranked.iter().map(|t| t.document_count).sum();
    let usage_share = if total_usage == 0 {
        0.0
    } else {
        ranked[0].document_count as f64 / total_usage as f64
    };

    (SIMILARITY_WEIGHT * average_similarity + USAGE_WEIGHT * usage_share).clamp(0.0, 1.0)
}
