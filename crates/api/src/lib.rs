//! Quill article service library.
//!
//! Exposes the orchestrator, background cleanup tasks, configuration and the
//! HTTP surface so the binary entrypoint and integration tests share them.

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod service;
pub mod state;
