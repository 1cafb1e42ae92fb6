use std::collections::HashMap;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::{Error, FieldErrors, Result};
use crate::models::{Account, Author, CommentDraft, CommentId};

const MAX_IDENTITY_LENGTH: usize = 255;
const MAX_URL_LENGTH: usize = 200;
const REQUIRED: &str = "This field is required.";

/// The account behind a request, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    Authenticated(Account),
}

impl Requester {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Requester::Authenticated(_))
    }

    pub fn account(&self) -> Option<&Account> {
        match self {
            Requester::Authenticated(account) => Some(account),
            Requester::Anonymous => None,
        }
    }
}

/// Value of the `type` discriminator field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Handle,
    Moderate,
    Comment,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Handle => "handle",
            ActionKind::Moderate => "moderate",
            ActionKind::Comment => "comment",
        }
    }
}

impl FromStr for ActionKind {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "handle" => Ok(ActionKind::Handle),
            "moderate" => Ok(ActionKind::Moderate),
            "comment" => Ok(ActionKind::Comment),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentForm {
    pub message: String,
    pub author: Author,
    pub url: String,
    pub parent: Option<CommentId>,
    pub notify_by_email: bool,
}

impl CommentForm {
    pub fn into_draft(self, post_slug: impl Into<String>, ip_address: Option<IpAddr>) -> CommentDraft {
        let mut draft = CommentDraft::new(post_slug, self.author, self.message);
        draft.parent_id = self.parent;
        draft.url = self.url;
        draft.notify_by_email = self.notify_by_email;
        draft.ip_address = ip_address;
        draft
    }
}

/// A validated form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Flip whether the post accepts comments.
    Handle,
    /// Flip the removed flag of one comment.
    Moderate { pk: CommentId, moderate: bool },
    Comment(CommentForm),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Handle => ActionKind::Handle,
            Action::Moderate { .. } => ActionKind::Moderate,
            Action::Comment(_) => ActionKind::Comment,
        }
    }

    /// Parses a posted form. A missing or unknown `type` yields `Ok(None)`: nothing to do.
    pub fn from_fields(fields: &HashMap<String, String>, requester: &Requester) -> Result<Option<Self>> {
        let kind = match field(fields, "type").and_then(|t| t.parse::<ActionKind>().ok()) {
            Some(kind) => kind,
            None => return Ok(None),
        };

        let action = match kind {
            ActionKind::Handle => Action::Handle,
            ActionKind::Moderate => {
                let pk = field(fields, "pk").ok_or_else(|| Error::invalid("pk", REQUIRED))?;
                Action::Moderate {
                    pk: CommentId::new(pk),
                    moderate: field(fields, "moderate").is_some(),
                }
            }
            ActionKind::Comment => Action::Comment(parse_comment(fields, requester)?),
        };
        Ok(Some(action))
    }
}

/// Trimmed, non-empty value of a field.
fn field<'a>(fields: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_comment(fields: &HashMap<String, String>, requester: &Requester) -> Result<CommentForm> {
    let mut errors = FieldErrors::new();

    let message = field(fields, "message");
    if message.is_none() {
        errors.add("message", REQUIRED);
    }

    let url = field(fields, "url").unwrap_or_default();
    check_length(&mut errors, "url", url, MAX_URL_LENGTH);

    // Name and email only matter without an account; otherwise they are ignored.
    let author = match requester {
        Requester::Authenticated(account) => Some(Author::Account(account.clone())),
        Requester::Anonymous => {
            let name = field(fields, "name");
            let email = field(fields, "email");
            for (key, value) in [("name", name), ("email", email)] {
                match value {
                    Some(v) => check_length(&mut errors, key, v, MAX_IDENTITY_LENGTH),
                    None => errors.add(key, REQUIRED),
                }
            }
            name.zip(email).map(|(name, email)| Author::Anonymous {
                name: name.to_string(),
                email: email.to_string(),
            })
        }
    };

    match (message, author) {
        (Some(message), Some(author)) if errors.is_empty() => Ok(CommentForm {
            message: message.to_string(),
            author,
            url: url.to_string(),
            parent: field(fields, "parent").map(CommentId::new),
            notify_by_email: fields
                .get("notify_by_email")
                .map_or(true, |v| !matches!(v.trim(), "" | "0" | "false" | "off")),
        }),
        _ => Err(Error::Validation(errors)),
    }
}

fn check_length(errors: &mut FieldErrors, key: &str, value: &str, max: usize) {
    let length = value.chars().count();
    if length > max {
        errors.add(
            key,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, length
            ),
        );
    }
}
