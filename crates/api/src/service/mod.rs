//! Article lifecycle orchestration.
//!
//! [`ArticleService`] is the only entry point for article operations. It
//! composes the relational store, the object store and the identity resolver,
//! none of which know about each other.

pub mod article_service;
pub mod views;

pub use article_service::{ArticleService, NewFile};
pub use views::{ArticleListResponse, ArticleView, AttachmentView};
