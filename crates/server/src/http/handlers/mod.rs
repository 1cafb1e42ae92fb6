pub mod admin;
pub mod challenge;
pub mod comments;
