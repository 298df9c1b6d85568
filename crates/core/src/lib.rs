//! Domain building blocks shared by every quill crate.
//!
//! Nothing in here performs I/O: the error taxonomy, identifier types,
//! request validation, and storage-key derivation live here so the
//! relational store, the object store adapter, and the orchestrator all
//! agree on them.

pub mod article;
pub mod error;
pub mod storage_key;
pub mod types;
