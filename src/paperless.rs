//! Paperless-ngx HTTP client module.
//!
//! This module provides a blocking HTTP client for the small slice of the
//! Paperless-ngx REST API the advisor needs: listing tags, querying documents by
//! tag, re-tagging documents and deleting tags.

mod client;

pub use client::{
    DocumentQuery, PaperlessApi, PaperlessClient, PaperlessClientBuilder, PaperlessError,
};
