use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::Comment;

/// The identity a comment is displayed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    pub url: String,
}

impl UserInfo {
    /// Account data wins over what was typed in, except for the url.
    pub fn resolve(comment: &Comment) -> Self {
        let mut info = UserInfo {
            name: comment.user_name.clone(),
            email: comment.user_email.clone(),
            url: comment.user_url.clone(),
        };

        if let Some(account) = &comment.user {
            if !account.email.is_empty() {
                info.email = account.email.clone();
            }

            // A typed-in name still beats the bare login.
            let full_name = account.full_name.trim();
            if !full_name.is_empty() {
                info.name = full_name.to_string();
            } else if comment.user_name.is_empty() {
                info.name = account.username.clone();
            }
        }

        info
    }
}

impl Comment {
    /// Resolved once per instance; later field changes are not reflected.
    pub fn userinfo(&self) -> &UserInfo {
        self.userinfo.get_or_init(|| UserInfo::resolve(self))
    }

    pub fn name(&self) -> &str {
        &self.userinfo().name
    }

    pub fn email(&self) -> &str {
        &self.userinfo().email
    }

    pub fn url(&self) -> &str {
        &self.userinfo().url
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        if self.user.is_some() {
            return Err(Error::ReadOnlyField { field: "name" });
        }
        self.user_name = name.into();
        Ok(())
    }

    pub fn set_email(&mut self, email: impl Into<String>) -> Result<()> {
        if self.user.is_some() {
            return Err(Error::ReadOnlyField { field: "email" });
        }
        self.user_email = email.into();
        Ok(())
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.user_url = url.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, CommentId, SiteId};
    use chrono::NaiveDateTime;

    fn comment() -> Comment {
        Comment::new(
            CommentId::new("c1"),
            SiteId::new_unchecked("default".into()),
            "post",
            NaiveDateTime::default(),
        )
    }

    fn account(full_name: &str, username: &str, email: &str) -> Account {
        Account {
            id: "1".into(),
            username: username.into(),
            email: email.into(),
            full_name: full_name.into(),
        }
    }

    #[test]
    fn anonymous_fields_pass_through() {
        let mut c = comment();
        c.user_name = "Ann".into();
        c.user_email = "a@x.com".into();
        c.user_url = "https://ann.example".into();

        assert_eq!(
            c.userinfo(),
            &UserInfo {
                name: "Ann".into(),
                email: "a@x.com".into(),
                url: "https://ann.example".into(),
            }
        );
    }

    #[test]
    fn blank_anonymous_comment_resolves_to_empty_strings() {
        let info = UserInfo::resolve(&comment());
        assert_eq!(info.name, "");
        assert_eq!(info.email, "");
        assert_eq!(info.url, "");
    }

    #[test]
    fn full_name_overrides_user_name() {
        let mut c = comment();
        c.user_name = "typed".into();
        c.user = Some(account("Ann Smith", "ann", "ann@example.com"));

        assert_eq!(c.name(), "Ann Smith");
        assert_eq!(c.email(), "ann@example.com");
    }

    #[test]
    fn username_used_only_when_nothing_else() {
        let mut c = comment();
        c.user = Some(account("", "ann", ""));
        assert_eq!(c.name(), "ann");

        let mut typed = comment();
        typed.user_name = "Annie".into();
        typed.user_email = "typed@x.com".into();
        typed.user = Some(account("  ", "ann", ""));
        assert_eq!(typed.name(), "Annie");
        // empty account email keeps the typed one
        assert_eq!(typed.email(), "typed@x.com");
    }

    #[test]
    fn empty_account_names_fall_through_to_blank() {
        let mut c = comment();
        c.user = Some(account("", "", "ann@example.com"));
        assert_eq!(c.name(), "");
    }

    #[test]
    fn url_never_comes_from_account() {
        let mut c = comment();
        c.user_url = "https://typed.example".into();
        c.user = Some(account("Ann", "ann", "ann@example.com"));
        assert_eq!(c.url(), "https://typed.example");
    }

    #[test]
    fn authenticated_name_and_email_are_read_only() {
        let mut c = comment();
        c.user = Some(account("Ann", "ann", "ann@example.com"));

        assert!(matches!(
            c.set_name("Bob"),
            Err(Error::ReadOnlyField { field: "name" })
        ));
        assert!(matches!(
            c.set_email("bob@x.com"),
            Err(Error::ReadOnlyField { field: "email" })
        ));
        assert!(c.user_name.is_empty());

        c.set_url("https://ann.example");
        assert_eq!(c.user_url, "https://ann.example");
    }

    #[test]
    fn anonymous_setters_write_through() {
        let mut c = comment();
        c.set_name("Bob").unwrap();
        c.set_email("bob@x.com").unwrap();
        c.set_url("https://bob.example");
        assert_eq!(c.user_name, "Bob");
        assert_eq!(c.user_email, "bob@x.com");
        assert_eq!(c.user_url, "https://bob.example");
    }

    #[test]
    fn userinfo_is_memoized_per_instance() {
        let mut c = comment();
        c.set_name("Ann").unwrap();
        assert_eq!(c.name(), "Ann");

        c.set_name("Bob").unwrap();
        assert_eq!(c.user_name, "Bob");
        assert_eq!(c.name(), "Ann");

        // a fresh instance resolves again
        let mut fresh = Comment::new(
            c.id.clone(),
            c.site_id.clone(),
            c.post_slug.clone(),
            c.created_at,
        );
        fresh.user_name = c.user_name.clone();
        assert_eq!(fresh.name(), "Bob");
    }
}
