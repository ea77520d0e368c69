use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Postgres connection string, or `memory` for the process-local store.
    pub database_url: String,
    pub media_root: PathBuf,
    pub media_url: String,
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".into());
        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid PORT: {}", e))?;
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let media_root = lookup("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("media"));
        let media_url = normalize_media_url(&lookup("MEDIA_URL").unwrap_or_else(|| "/media/".into()));
        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid MAX_UPLOAD_BYTES: {}", e))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            database_url,
            media_root,
            media_url,
            max_upload_bytes,
            cors_origins,
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == "memory"
    }
}

fn normalize_media_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return format!("{}/", raw.trim_end_matches('/'));
    }
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        "/".into()
    } else {
        format!("/{}/", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_is_set() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/blog")]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.media_root, PathBuf::from("media"));
        assert_eq!(config.media_url, "/media/");
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.cors_origins, ["*"]);
        assert!(!config.uses_memory_store());
    }

    #[test]
    fn database_url_is_required() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = config(&[("DATABASE_URL", "memory"), ("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = config(&[
            ("DATABASE_URL", "memory"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,,"),
        ])
        .unwrap();
        assert_eq!(config.cors_origins, ["http://a.test", "http://b.test"]);
        assert!(config.uses_memory_store());
    }

    #[rstest]
    #[case("/media/", "/media/")]
    #[case("media", "/media/")]
    #[case("/static/uploads", "/static/uploads/")]
    #[case("/", "/")]
    #[case("https://cdn.test/media", "https://cdn.test/media/")]
    fn media_url_is_normalized(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_media_url(raw), expected);
    }
}
