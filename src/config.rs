use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "bella.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub ontology_path: String,
    pub ontology_file: Option<PathBuf>,
    pub image_prompt: String,
    pub show_ontology: bool,
    pub log_filter: String,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            ontology_path: "/lattice/skypad_ontology_mvp.jsonld".to_string(),
            ontology_file: None,
            image_prompt: "Describe this image and what it shows.".to_string(),
            show_ontology: false,
            log_filter: "info".to_string(),
            window_width: 1100.0,
            window_height: 760.0,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),

    #[error("api_base_url must be an http(s) URL, got {0:?}")]
    InvalidBaseUrl(String),

    #[error("ontology_path must not be empty")]
    MissingOntologyPath,
}

impl AppConfig {
    /// Defaults, then `bella.toml` (or `$BELLA_CONFIG`), then `BELLA_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("BELLA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_figment(Self::figment(path))
    }

    pub fn figment(path: PathBuf) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("BELLA_").ignore(&["config"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.api_base_url.clone()));
        }
        if self.ontology_path.trim().is_empty() && self.ontology_file.is_none() {
            return Err(ConfigError::MissingOntologyPath);
        }
        Ok(())
    }

    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.api_base_url, path)
    }
}

pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        path.trim().trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::{join_url, AppConfig, ConfigError};
    use figment::providers::{Format, Serialized, Toml};
    use figment::Figment;

    fn with_toml(raw: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(raw))
    }

    #[test]
    fn defaults_point_at_local_backend() {
        let config = AppConfig::from_figment(with_toml("")).expect("defaults should be valid");
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(
            config.endpoint(&config.ontology_path),
            "http://localhost:8000/lattice/skypad_ontology_mvp.jsonld"
        );
        assert!(!config.show_ontology);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = AppConfig::from_figment(with_toml(
            r#"
api_base_url = "https://bella.example.com/"
show_ontology = true
ontology_file = "lattice/local.jsonld"
"#,
        ))
        .expect("override should be valid");
        assert_eq!(config.endpoint("/api/chat"), "https://bella.example.com/api/chat");
        assert!(config.show_ontology);
        assert_eq!(
            config.ontology_file.as_deref(),
            Some(std::path::Path::new("lattice/local.jsonld"))
        );
    }

    #[test]
    fn rejects_non_http_base_url() {
        let error = AppConfig::from_figment(with_toml(r#"api_base_url = "localhost:8000""#))
            .expect_err("scheme-less url should be rejected");
        assert!(matches!(error, ConfigError::InvalidBaseUrl(_)));
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://a/", "/b"), "http://a/b");
        assert_eq!(join_url("http://a", "b"), "http://a/b");
    }
}
