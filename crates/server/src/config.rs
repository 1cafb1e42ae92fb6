use config::ConfigError;
use domain::CommentsSettings;
use serde::Deserialize;

const ENV_PREFIX: &str = "COMMENTS_";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub security: SecuritySettings,
    pub comments: CommentsSettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct SecuritySettings {
    pub admin_token: String,
    pub pow_difficulty: usize,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cors_origins", "*")?
            .set_default("database.url", "sqlite://data/comments.db")?
            .set_default("security.admin_token", "admin_secret_123")?
            .set_default("security.pow_difficulty", 4)?
            .set_default("comments.max_length", 3000)?
            .set_default("comments.enable_captcha", true)?
            .set_default("comments.site_id", "default")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false));

        for (key, value) in env_overrides(std::env::vars()) {
            builder = builder.set_override(key, value)?;
        }

        builder.build()?.try_deserialize()
    }
}

/// `COMMENTS_COMMENTS__COMMENT_MODEL=blog.PostComment` -> `comments.comment_model`
fn env_overrides(vars: impl IntoIterator<Item = (String, String)>) -> Vec<(String, String)> {
    vars.into_iter()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .map(|(k, v)| {
            let key = k
                .trim_start_matches(ENV_PREFIX)
                .replace("__", ".")
                .to_lowercase();
            (key, v)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn maps_prefixed_vars_to_nested_keys() {
        let overrides = env_overrides(vars(&[
            ("COMMENTS_COMMENTS__MAX_LENGTH", "500"),
            ("COMMENTS_SECURITY__POW_DIFFICULTY", "2"),
            ("PATH", "/usr/bin"),
            ("RUN_MODE", "test"),
        ]));

        assert_eq!(
            overrides,
            vars(&[
                ("comments.max_length", "500"),
                ("security.pow_difficulty", "2"),
            ])
        );
    }

    #[test]
    fn overrides_reach_comment_settings() {
        let mut builder = config::Config::builder().set_default("comments.max_length", 3000).unwrap();
        for (key, value) in env_overrides(vars(&[("COMMENTS_COMMENTS__MAX_LENGTH", "500")])) {
            builder = builder.set_override(key, value).unwrap();
        }
        let comments: CommentsSettings = builder
            .build()
            .unwrap()
            .get("comments")
            .unwrap();

        assert_eq!(comments.max_length, Some(500));
    }
}
