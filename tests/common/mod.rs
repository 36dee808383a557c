//! In-memory stand-in for the Paperless-ngx API shared by integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use tagdedup::paperless::{DocumentQuery, PaperlessApi, PaperlessError};
use tagdedup::{Document, DocumentId, DocumentPage, Tag, TagId};

/// A request the fake received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListTags,
    Documents(TagId, DocumentQuery),
    Patch(DocumentId, Vec<TagId>),
    Delete(TagId),
}

#[derive(Default)]
struct State {
    tags: Vec<Tag>,
    documents: Vec<Document>,
    calls: Vec<Call>,
    fail_list: bool,
    failing_fetches: HashSet<TagId>,
    failing_patches: HashSet<DocumentId>,
    failing_deletes: HashSet<TagId>,
}

/// Fake document system holding tags and documents in memory.
#[derive(Default)]
pub struct FakePaperless {
    state: Mutex<State>,
}

impl FakePaperless {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(self, id: i64, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .tags
            .push(Tag::new(TagId::new(id), name));
        self
    }

    pub fn with_document(self, id: i64, created: &str, tags: &[i64]) -> Self {
        self.state.lock().unwrap().documents.push(Document {
            id: DocumentId::new(id),
            created: Some(created.to_string()),
            tags: tags.iter().map(|&t| TagId::new(t)).collect(),
        });
        self
    }

    pub fn failing_tag_list(self) -> Self {
        self.state.lock().unwrap().fail_list = true;
        self
    }

    pub fn failing_fetch(self, tag: i64) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_fetches
            .insert(TagId::new(tag));
        self
    }

    pub fn failing_patch(self, document: i64) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_patches
            .insert(DocumentId::new(document));
        self
    }

    pub fn failing_delete(self, tag: i64) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_deletes
            .insert(TagId::new(tag));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn deleted_tags(&self) -> Vec<TagId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(tag) => Some(tag),
                _ => None,
            })
            .collect()
    }

    pub fn patch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Patch(..)))
            .count()
    }

    pub fn tag_ids(&self) -> Vec<TagId> {
        self.state.lock().unwrap().tags.iter().map(|t| t.id).collect()
    }

    pub fn document_tags(&self, document: i64) -> Vec<TagId> {
        self.state
            .lock()
            .unwrap()
            .documents
            .iter()
            .find(|d| d.id == DocumentId::new(document))
            .map(|d| d.tags.clone())
            .unwrap_or_default()
    }
}

fn server_error() -> PaperlessError {
    PaperlessError::Http {
        status: 500,
        body: "Internal Server Error".to_string(),
    }
}

impl PaperlessApi for FakePaperless {
    fn list_tags(&self) -> Result<Vec<Tag>, PaperlessError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListTags);
        if state.fail_list {
            return Err(server_error());
        }
        Ok(state.tags.clone())
    }

    fn documents_with_tag(
        &self,
        tag: TagId,
        query: DocumentQuery,
    ) -> Result<DocumentPage, PaperlessError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Documents(tag, query));
        if state.failing_fetches.contains(&tag) {
            return Err(server_error());
        }

        let mut matching: Vec<Document> = state
            .documents
            .iter()
            .filter(|d| d.has_tag(tag))
            .cloned()
            .collect();
        if query.newest_first {
            matching.sort_by(|a, b| b.created.cmp(&a.created));
        }

        let count = matching.len() as u64;
        matching.truncate(query.page_size as usize);

        Ok(DocumentPage {
            count,
            next: None,
            results: matching,
        })
    }

    fn update_document_tags(
        &self,
        document: DocumentId,
        tags: &[TagId],
    ) -> Result<(), PaperlessError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Patch(document, tags.to_vec()));
        if state.failing_patches.contains(&document) {
            return Err(server_error());
        }

        match state.documents.iter_mut().find(|d| d.id == document) {
            Some(doc) => {
                doc.tags = tags.to_vec();
                Ok(())
            }
            None => Err(PaperlessError::Http {
                status: 404,
                body: "Not found.".to_string(),
            }),
        }
    }

    fn delete_tag(&self, tag: TagId) -> Result<(), PaperlessError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(tag));
        if state.failing_deletes.contains(&tag) {
            return Err(server_error());
        }

        state.tags.retain(|t| t.id != tag);
        for doc in &mut state.documents {
            doc.tags.retain(|&t| t != tag);
        }
        Ok(())
    }
}
