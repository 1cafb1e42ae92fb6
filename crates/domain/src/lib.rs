mod actions;
mod avatar;
mod error;
mod filter;
mod identity;
mod models;
mod settings;
mod thread;

pub use actions::{Action, ActionKind, CommentForm, Requester};
pub use avatar::{gravatar_for, gravatar_url, Avatar};
pub use error::{Error, FieldErrors, Result};
pub use filter::CommentFilter;
pub use identity::UserInfo;
pub use models::{Account, Author, Comment, CommentDraft, CommentId, Post, SiteId};
pub use settings::{
    CommentModel, CommentsConfig, CommentsSettings, DefaultImage, GravatarConfig, Rating,
};
pub use thread::{build_thread, ThreadNode};
