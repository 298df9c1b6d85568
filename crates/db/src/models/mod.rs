//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity matching a table
//! row, plus the `Deserialize` input DTOs the repositories accept.

pub mod article;
pub mod attachment;
pub mod like;
