use std::str::FromStr;

use crate::error::Error;
use crate::models::Comment;

/// Moderation projections over a set of comments. Unset fields don't filter.
///
/// ```
/// use domain::CommentFilter;
/// let hidden_and_removed = CommentFilter::all().moderated().removed();
/// assert_eq!(hidden_and_removed.is_public, Some(false));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommentFilter {
    pub is_public: Option<bool>,
    pub is_removed: Option<bool>,
}

impl CommentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn public(mut self) -> Self {
        self.is_public = Some(true);
        self
    }

    pub fn moderated(mut self) -> Self {
        self.is_public = Some(false);
        self
    }

    pub fn removed(mut self) -> Self {
        self.is_removed = Some(true);
        self
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        self.is_public.map_or(true, |v| comment.is_public == v)
            && self.is_removed.map_or(true, |v| comment.is_removed == v)
    }
}

impl FromStr for CommentFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::all()),
            "public" => Ok(Self::all().public()),
            "moderated" => Ok(Self::all().moderated()),
            "removed" => Ok(Self::all().removed()),
            other => Err(Error::invalid(
                "view",
                format!("Unknown view '{}'. Use public, moderated, removed or all.", other),
            )),
        }
    }
}
