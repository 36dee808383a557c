//! Per-tag document usage lookups.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{Tag, TagId};
use crate::paperless::{DocumentQuery, PaperlessApi, PaperlessError};

/// How many documents use a tag and when it was last used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub document_count: u64,
    /// Creation timestamp of the newest document carrying the tag.
    pub last_used_timestamp: Option<String>,
    /// Set when the lookup failed; the counts are then zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UsageRecord {
    /// Record for a tag whose lookup failed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            document_count: 0,
            last_used_timestamp: None,
            error: Some(error.into()),
        }
    }
}

/// Usage records keyed by tag id.
pub type UsageMap = BTreeMap<TagId, UsageRecord>;

/// Looks up usage for every tag, one tag at a time.
///
/// A failed lookup never aborts the batch: that tag gets a zeroed record carrying
/// the error message and the remaining tags are still processed.
pub fn analyze_usage(api: &dyn PaperlessApi, tags: &[Tag]) -> UsageMap {
    info!(tags = tags.len(), "analyzing tag usage");

    let mut usage = UsageMap::new();
    for tag in tags {
        let record = match lookup_usage(api, tag.id) {
            Ok(record) => record,
            Err(e) => {
                warn!(tag = %tag.id, name = %tag.name, error = %e, "usage lookup failed");
                UsageRecord::failed(e.to_string())
            }
        };
        usage.insert(tag.id, record);
    }

    let failed = usage.values().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        warn!(failed, "some usage lookups failed");
    }

    usage
}

/// Looks up the document count and latest use of a single tag.
///
/// Reads the total `count` from a one-document page, then, when the tag is in
/// use, fetches the newest document to read its creation timestamp.
pub fn lookup_usage(api: &dyn PaperlessApi, tag: TagId) -> Result<UsageRecord, PaperlessError> {
    let document_count = api.documents_with_tag(tag, DocumentQuery::count_only())?.count;

    let last_used_timestamp = if document_count > 0 {
        api.documents_with_tag(tag, DocumentQuery::most_recent())?
            .results
            .into_iter()
            .next()
            .and_then(|doc| doc.created)
    } else {
        None
    };

    debug!(tag = %tag, document_count, ?last_used_timestamp, "tag usage");

    Ok(UsageRecord {
        document_count,
        last_used_timestamp,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, DocumentId, DocumentPage};
    use std::sync::Mutex;

    /// Serves a fixed count and newest-document date per tag, failing for tag 13.
    struct StubApi {
        calls: Mutex<Vec<(TagId, DocumentQuery)>>,
    }

    impl StubApi {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl PaperlessApi for StubApi {
        fn list_tags(&self) -> Result<Vec<Tag>, PaperlessError> {
            Ok(Vec::new())
        }

        fn documents_with_tag(
            &self,
            tag: TagId,
            query: DocumentQuery,
        ) -> Result<DocumentPage, PaperlessError> {
            self.calls.lock().unwrap().push((tag, query));

            if tag.get() == 13 {
                return Err(PaperlessError::Http {
                    status: 500,
                    body: "boom".to_string(),
                });
            }

            let count = tag.get() as u64 - 1;
            let results = if count > 0 {
                vec![Document {
                    id: DocumentId::new(tag.get() * 100),
                    created: Some(format!("2024-0{}-01", tag.get())),
                    tags: vec![tag],
                }]
            } else {
                Vec::new()
            };

            Ok(DocumentPage {
                count,
                next: None,
                results,
            })
        }

        fn update_document_tags(
            &self,
            _document: DocumentId,
            _tags: &[TagId],
        ) -> Result<(), PaperlessError> {
            unreachable!("usage analysis never writes")
        }

        fn delete_tag(&self, _tag: TagId) -> Result<(), PaperlessError> {
            unreachable!("usage analysis never deletes")
        }
    }

    #[test]
    fn unused_tag_needs_only_the_count_query() {
        let api = StubApi::new();
        let record = lookup_usage(&api, TagId::new(1)).unwrap();

        assert_eq!(record, UsageRecord::default());
        assert_eq!(
            *api.calls.lock().unwrap(),
            vec![(TagId::new(1), DocumentQuery::count_only())]
        );
    }

    #[test]
    fn used_tag_reads_newest_document_date() {
        let api = StubApi::new();
        let record = lookup_usage(&api, TagId::new(3)).unwrap();

        assert_eq!(record.document_count, 2);
        assert_eq!(record.last_used_timestamp.as_deref(), Some("2024-03-01"));
        assert_eq!(record.error, None);
        assert_eq!(
            api.calls.lock().unwrap()[1],
            (TagId::new(3), DocumentQuery::most_recent())
        );
    }

    #[test]
    fn one_failing_tag_does_not_abort_the_batch() {
        let api = StubApi::new();
        let tags = vec![
            Tag::new(TagId::new(2), "a"),
            Tag::new(TagId::new(13), "broken"),
            Tag::new(TagId::new(4), "b"),
        ];

        let usage = analyze_usage(&api, &tags);

        assert_eq!(usage.len(), 3);
        assert_eq!(usage[&TagId::new(2)].document_count, 1);
        assert_eq!(usage[&TagId::new(4)].document_count, 3);

        let broken = &usage[&TagId::new(13)];
        assert_eq!(broken.document_count, 0);
        assert_eq!(broken.last_used_timestamp, None);
        assert!(broken.error.as_deref().unwrap().contains("500"));
    }

    #[test]
    fn record_serializes_with_camel_case_and_null_timestamp() {
        let json = serde_json::to_value(UsageRecord::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"documentCount": 0, "lastUsedTimestamp": null})
        );

        let failed = serde_json::to_value(UsageRecord::failed("timeout")).unwrap();
        assert_eq!(failed["error"], "timeout");
    }
}
