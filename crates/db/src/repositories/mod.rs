//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Inputs are validated before any
//! query is issued.

pub mod article_repo;
pub mod attachment_repo;
pub mod like_repo;

pub use article_repo::ArticleRepo;
pub use attachment_repo::AttachmentRepo;
pub use like_repo::LikeRepo;
