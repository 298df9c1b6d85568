/// Article primary key. UUIDv7, see [`crate::article::new_article_id`].
pub type DbId = uuid::Uuid;

/// Opaque author identifier owned by the external identity service.
pub type AuthorId = String;

pub type Timestamp = chrono::DateTime<chrono::Utc>;
