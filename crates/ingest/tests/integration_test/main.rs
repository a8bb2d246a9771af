//! Integration tests for ragprep-ingest.
//!
//! Extraction and embedding are replaced by in-process fakes so the tests
//! run without PDFs or a model server.

mod artifacts;
mod batch;
mod embedding;
mod helpers;
