//! Greedy seed-based clustering of tags with near-duplicate names.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::similarity::name_similarity;
use crate::models::{Tag, TagId};

/// Tags judged to be near-duplicates of each other by name.
///
/// The first tag is the seed the other members were compared against. Groups
/// produced by [`group_similar_tags`] always hold at least two tags with unique ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimilarityGroup {
    tags: Vec<Tag>,
}

impl SimilarityGroup {
    /// Wraps an ordered list of tags as a group.
    pub fn new(tags: Vec<Tag>) -> Self {
        Self { tags }
    }

    /// Returns the tag that started the group, if any.
    pub fn seed(&self) -> Option<&Tag> {
        self.tags.first()
    }

    /// Returns the members in grouping order.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Returns the member ids in grouping order.
    pub fn ids(&self) -> Vec<TagId> {
        self.tags.iter().map(|t| t.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Groups tags whose names are at least `threshold` similar to a group seed.
///
/// Uses [`name_similarity`], so case differences never keep tags apart.
///
/// # Examples
///
/// ```
/// use tagdedup::dedup::group_similar_tags;
/// use tagdedup::{Tag, TagId};
///
/// let tags = vec![
///     Tag::new(TagId::new(1), "Invoice"),
///     Tag::new(TagId::new(2), "invoice"),
///     Tag::new(TagId::new(3), "Receipt"),
/// ];
/// let groups = group_similar_tags(&tags, 0.8);
///
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].ids(), vec![TagId::new(1), TagId::new(2)]);
/// ```
#[must_use]
pub fn group_similar_tags(tags: &[Tag], threshold: f64) -> Vec<SimilarityGroup> {
    group_by(tags, threshold, name_similarity)
}

/// Groups tags with a caller-supplied name similarity.
///
/// Tags are visited in order. Each tag not yet assigned seeds a new group, and
/// every later unassigned tag scoring at least `threshold` against the seed joins
/// it. Members are only compared with the seed, never with each other, so the
/// result is not a transitive closure. Groups with a single member are dropped.
pub fn group_by<F>(tags: &[Tag], threshold: f64, similarity: F) -> Vec<SimilarityGroup>
where
    F: Fn(&str, &str) -> f64,
{
    let mut assigned: HashSet<TagId> = HashSet::new();
    let mut groups = Vec::new();

    for (index, seed) in tags.iter().enumerate() {
        if !assigned.insert(seed.id) {
            continue;
        }

        let mut members = vec![seed.clone()];
        for candidate in &tags[index + 1..] {
            if assigned.contains(&candidate.id) {
                continue;
            }
            if similarity(&seed.name, &candidate.name) >= threshold {
                assigned.insert(candidate.id);
                members.push(candidate.clone());
            }
        }

        if members.len() >= 2 {
            groups.push(SimilarityGroup::new(members));
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: i64, name: &str) -> Tag {
        Tag::new(TagId::new(id), name)
    }

    /// Similarity driven by an explicit table of letter pairs; anything else is 0.
    fn table(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str, &str) -> f64 {
        move |a: &str, b: &str| {
            if a == b || pairs.iter().any(|&(x, y)| (x == a && y == b) || (x == b && y == a)) {
                1.0
            } else {
                0.0
            }
        }
    }

    #[test]
    fn empty_and_single_inputs_produce_no_groups() {
        assert!(group_similar_tags(&[], 0.8).is_empty());
        assert!(group_similar_tags(&[tag(1, "Invoice")], 0.8).is_empty());
    }

    #[test]
    fn unique_names_produce_no_groups() {
        let tags = vec![tag(1, "Invoice"), tag(2, "Receipt"), tag(3, "Contract")];
        assert!(group_similar_tags(&tags, 0.8).is_empty());
    }

    #[test]
    fn case_only_differences_group_together() {
        let tags = vec![tag(1, "Invoice"), tag(2, "invoice"), tag(3, "Receipt")];
        let groups = group_similar_tags(&tags, 0.8);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].tags(), &[tag(1, "Invoice"), tag(2, "invoice")]);
    }

    #[test]
    fn groups_keep_fetch_order_with_seed_first() {
        let tags = vec![
            tag(1, "Tax"),
            tag(2, "Invoices"),
            tag(3, "Receipt"),
            tag(4, "invoice"),
            tag(5, "INVOICES"),
        ];
        let groups = group_similar_tags(&tags, 0.8);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].seed(), Some(&tag(2, "Invoices")));
        assert_eq!(
            groups[0].ids(),
            vec![TagId::new(2), TagId::new(4), TagId::new(5)]
        );
    }

    #[test]
    fn members_similar_only_to_each_other_are_not_chained() {
        // b ~ a and c ~ b, but c is not similar to the seed a.
        let tags = vec![tag(1, "a"), tag(2, "b"), tag(3, "c")];
        let groups = group_by(&tags, 0.8, table(&[("a", "b"), ("b", "c")]));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].ids(), vec![TagId::new(1), TagId::new(2)]);
    }

    #[test]
    fn members_need_not_be_similar_to_each_other() {
        // b and c are both similar to the seed a but not to each other.
        let tags = vec![tag(1, "a"), tag(2, "b"), tag(3, "c")];
        let groups = group_by(&tags, 0.8, table(&[("a", "b"), ("a", "c")]));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn assigned_tags_never_seed_or_join_again() {
        let tags = vec![tag(1, "a"), tag(2, "b"), tag(3, "c"), tag(4, "d")];
        let groups = group_by(&tags, 0.8, table(&[("a", "b"), ("b", "c"), ("c", "d")]));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].ids(), vec![TagId::new(1), TagId::new(2)]);
        assert_eq!(groups[1].ids(), vec![TagId::new(3), TagId::new(4)]);

        let mut seen = HashSet::new();
        for id in groups.iter().flat_map(SimilarityGroup::ids) {
            assert!(seen.insert(id), "tag {id} appears in more than one group");
        }
    }

    #[test]
    fn threshold_is_inclusive() {
        let tags = vec![tag(1, "a"), tag(2, "b")];
        let exactly = |_: &str, _: &str| 0.8;

        assert_eq!(group_by(&tags, 0.8, exactly).len(), 1);
        assert!(group_by(&tags, 0.81, exactly).is_empty());
    }

    #[test]
    fn serializes_as_plain_array_of_tags() {
        let group = SimilarityGroup::new(vec![tag(1, "Invoice"), tag(2, "invoice")]);
        let json = serde_json::to_value(&group).unwrap();

        assert_eq!(
            json,
            serde_json::json!([{"id": 1, "name": "Invoice"}, {"id": 2, "name": "invoice"}])
        );
    }
}
