use md5::{Digest, Md5};
use serde::Serialize;

use crate::models::Comment;
use crate::settings::CommentsConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Avatar {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub alt: String,
}

/// `<base>avatar/<md5(email)>.png?s=<size>&r=<rating>&d=<default>`
pub fn gravatar_url(email: &str, size: u32, secure: bool, config: &CommentsConfig) -> String {
    let gravatar = &config.gravatar;
    let hash = hex::encode(Md5::digest(email.trim().to_lowercase().as_bytes()));

    let mut url = format!(
        "{}avatar/{}.png?s={}&r={}",
        gravatar.base_url(secure),
        hash,
        size,
        gravatar.default_rating.as_str()
    );
    let fallback = config
        .default_avatar
        .as_deref()
        .unwrap_or(gravatar.default_image.as_str());
    url.push_str("&d=");
    url.push_str(&urlencoding::encode(fallback));
    url
}

/// Avatar of the comment's resolved identity. `size` and `secure` fall back to the configured
/// defaults.
pub fn gravatar_for(
    comment: &Comment,
    size: Option<u32>,
    secure: Option<bool>,
    config: &CommentsConfig,
) -> Avatar {
    let size = size.unwrap_or(config.gravatar.default_size);
    let secure = secure.unwrap_or(config.gravatar.default_secure);
    Avatar {
        url: gravatar_url(comment.email(), size, secure, config),
        width: size,
        height: size,
        alt: comment.name().to_string(),
    }
}
