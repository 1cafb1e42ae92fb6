use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::models::SiteId;

/// Gravatar content rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    #[default]
    G,
    Pg,
    R,
    X,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::G => "g",
            Rating::Pg => "pg",
            Rating::R => "r",
            Rating::X => "x",
        }
    }
}

/// Image Gravatar serves when an address has no avatar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultImage {
    #[serde(rename = "404")]
    NotFound,
    #[default]
    #[serde(rename = "mm")]
    MysteryMan,
    #[serde(rename = "identicon")]
    Identicon,
    #[serde(rename = "monsterid")]
    Monster,
    #[serde(rename = "wavatar")]
    Wavatar,
    #[serde(rename = "retro")]
    Retro,
}

impl DefaultImage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultImage::NotFound => "404",
            DefaultImage::MysteryMan => "mm",
            DefaultImage::Identicon => "identicon",
            DefaultImage::Monster => "monsterid",
            DefaultImage::Wavatar => "wavatar",
            DefaultImage::Retro => "retro",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravatarConfig {
    pub url: String,
    pub secure_url: String,
    pub default_size: u32,
    pub default_image: DefaultImage,
    pub default_rating: Rating,
    pub default_secure: bool,
}

impl Default for GravatarConfig {
    fn default() -> Self {
        Self {
            url: "http://www.gravatar.com/".to_string(),
            secure_url: "https://secure.gravatar.com/".to_string(),
            default_size: 80,
            default_image: DefaultImage::MysteryMan,
            default_rating: Rating::G,
            default_secure: true,
        }
    }
}

impl GravatarConfig {
    pub fn base_url(&self, secure: bool) -> &str {
        if secure {
            &self.secure_url
        } else {
            &self.url
        }
    }
}

/// The concrete comment entity, written `app_label.ModelName`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentModel {
    app_label: String,
    model_name: String,
}

impl CommentModel {
    pub fn app_label(&self) -> &str {
        &self.app_label
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// `blog.PostComment` lives in `blog_postcomment`.
    pub fn table_name(&self) -> String {
        format!("{}_{}", self.app_label, self.model_name).to_ascii_lowercase()
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FromStr for CommentModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((app, model)) if is_identifier(app) && is_identifier(model) => Ok(Self {
                app_label: app.to_string(),
                model_name: model.to_string(),
            }),
            _ => Err(Error::Configuration(format!(
                "comment_model must be of the form 'app_label.ModelName', got '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for CommentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model_name)
    }
}

/// Comment settings as read from configuration sources, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentsSettings {
    pub max_length: Option<usize>,
    pub enable_captcha: Option<bool>,
    pub default_avatar: Option<String>,
    pub comment_model: Option<String>,
    pub site_id: Option<String>,
    #[serde(default)]
    pub gravatar: GravatarConfig,
}

/// Validated comment settings, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct CommentsConfig {
    pub max_length: usize,
    /// Not consulted by the comment logic itself; the HTTP layer gates submissions on it.
    pub enable_captcha: bool,
    /// Absolute url of the fallback avatar image.
    pub default_avatar: Option<String>,
    pub comment_model: CommentModel,
    /// The site new comments are stamped with.
    pub site_id: SiteId,
    pub gravatar: GravatarConfig,
}

impl CommentsConfig {
    pub const DEFAULT_MAX_LENGTH: usize = 3000;
    pub const DEFAULT_SITE: &'static str = "default";

    pub fn new(comment_model: CommentModel) -> Self {
        Self {
            max_length: Self::DEFAULT_MAX_LENGTH,
            enable_captcha: true,
            default_avatar: None,
            comment_model,
            site_id: SiteId::new_unchecked(Self::DEFAULT_SITE.to_string()),
            gravatar: GravatarConfig::default(),
        }
    }
}

impl TryFrom<CommentsSettings> for CommentsConfig {
    type Error = Error;

    fn try_from(raw: CommentsSettings) -> Result<Self, Self::Error> {
        let model = raw
            .comment_model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration("comments settings do not have a comment_model field".into())
            })?;

        let mut config = CommentsConfig::new(model.trim().parse()?);
        if let Some(max_length) = raw.max_length {
            config.max_length = max_length;
        }
        if let Some(enable_captcha) = raw.enable_captcha {
            config.enable_captcha = enable_captcha;
        }
        config.default_avatar = raw.default_avatar.filter(|s| !s.trim().is_empty());
        if let Some(site) = raw.site_id {
            config.site_id = SiteId::new(site).map_err(Error::Configuration)?;
        }
        config.gravatar = raw.gravatar;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_enumerated() {
        let config = CommentsConfig::new("blog.PostComment".parse().unwrap());
        assert_eq!(config.max_length, 3000);
        assert!(config.enable_captcha);
        assert_eq!(config.default_avatar, None);
        assert_eq!(config.site_id.as_str(), "default");
        assert_eq!(config.gravatar.default_size, 80);
        assert_eq!(config.gravatar.default_rating, Rating::G);
        assert_eq!(config.gravatar.default_image.as_str(), "mm");
        assert!(config.gravatar.default_secure);
        assert_eq!(config.gravatar.base_url(false), "http://www.gravatar.com/");
        assert_eq!(config.gravatar.base_url(true), "https://secure.gravatar.com/");
    }

    #[test]
    fn missing_comment_model_is_a_configuration_error() {
        let err = CommentsConfig::try_from(CommentsSettings::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let blank = CommentsSettings {
            comment_model: Some("  ".into()),
            ..Default::default()
        };
        assert!(matches!(
            CommentsConfig::try_from(blank),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn settings_override_defaults() {
        let raw = CommentsSettings {
            max_length: Some(500),
            enable_captcha: Some(false),
            default_avatar: Some("https://cdn.example/avatar.png".into()),
            comment_model: Some("blog.PostComment".into()),
            site_id: Some("blog.example".into()),
            gravatar: GravatarConfig {
                default_rating: Rating::Pg,
                ..Default::default()
            },
        };
        let config = CommentsConfig::try_from(raw).unwrap();
        assert_eq!(config.max_length, 500);
        assert!(!config.enable_captcha);
        assert_eq!(config.site_id.as_str(), "blog.example");
        assert_eq!(config.gravatar.default_rating, Rating::Pg);
        assert_eq!(config.comment_model.table_name(), "blog_postcomment");
    }

    #[test]
    fn comment_model_must_be_dotted_identifiers() {
        let model: CommentModel = "blog.PostComment".parse().unwrap();
        assert_eq!(model.app_label(), "blog");
        assert_eq!(model.model_name(), "PostComment");
        assert_eq!(model.to_string(), "blog.PostComment");

        for bad in ["PostComment", "blog.", ".Post", "blog.Post;DROP", "1app.Post"] {
            assert!(bad.parse::<CommentModel>().is_err(), "{}", bad);
        }
    }

    #[test]
    fn invalid_site_is_a_configuration_error() {
        let raw = CommentsSettings {
            comment_model: Some("blog.PostComment".into()),
            site_id: Some("bad_site".into()),
            ..Default::default()
        };
        assert!(matches!(
            CommentsConfig::try_from(raw),
            Err(Error::Configuration(_))
        ));
    }
}
