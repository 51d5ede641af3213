//! Page configuration.
//!
//! Built-in defaults, optionally replaced by a TOML document. On Spin the
//! component overlays a couple of variables on top (see [`PageConfig::with_overrides`]).

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use edge_sdk::edge_cache::QueryOptions;
use edge_sdk::edge_data::RetryPolicy;
use edge_sdk::edge_executor::OrderingStrategy;
use serde::{Deserialize, Serialize};

use crate::sections::SectionKind;

/// The configuration shipped with the component.
pub const BUNDLED_CONFIG: &str = include_str!("../page.toml");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid api_base_url {0:?}: expected an http(s) URL")]
    InvalidBaseUrl(String),

    #[error("invalid avatar palette colour {0:?}: expected #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// When a finished section may be streamed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillOrder {
    /// As soon as its data resolves.
    #[default]
    OutOfOrder,
    /// In page order.
    Strict,
}

impl FillOrder {
    pub fn strategy(&self) -> OrderingStrategy {
        match self {
            Self::OutOfOrder => OrderingStrategy::OutOfOrder,
            Self::Strict => OrderingStrategy::Strict,
        }
    }
}

/// Reviewer avatar service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub base_url: String,
    /// Pixel size requested from the service.
    pub size: u32,
    /// `#rrggbb` colours.
    pub palette: Vec<String>,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://source.boringavatars.com/beam".to_string(),
            size: 40,
            palette: ["#264653", "#2a9d8f", "#e9c46a", "#f4a261", "#e76f51"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl AvatarConfig {
    /// Palette as the service's `colors` parameter: comma-joined, no `#`.
    pub fn colors_param(&self) -> String {
        self.palette
            .iter()
            .map(|c| c.trim_start_matches('#'))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Product page configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Catalog service root, without a trailing slash.
    pub api_base_url: String,
    /// Staleness window for every query, and the page's `max-age`.
    pub stale_time_secs: u64,
    /// `stale-while-revalidate` for page responses.
    pub swr_secs: u64,
    /// Retries for query fetches.
    pub retry: RetryPolicy,
    pub avatar: AvatarConfig,
    /// Sections the browser loads through the fragment route instead of
    /// being streamed with the page.
    pub client_sections: Vec<SectionKind>,
    /// Appended to the product name in the document title.
    pub title_suffix: String,
    pub ordering: FillOrder,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".to_string(),
            stale_time_secs: 300,
            swr_secs: 60,
            retry: RetryPolicy::default(),
            avatar: AvatarConfig::default(),
            client_sections: Vec::new(),
            title_suffix: " | Storefront".to_string(),
            ordering: FillOrder::default(),
        }
    }
}

impl PageConfig {
    /// Parse and validate a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validated()
    }

    /// The configuration bundled into the component.
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_toml_str(BUNDLED_CONFIG).context("bundled page.toml is invalid")
    }

    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("failed to load {}", path.display()))
    }

    /// Apply runtime overrides. `None` leaves a value untouched.
    pub fn with_overrides(
        mut self,
        api_base_url: Option<String>,
        stale_time_secs: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = api_base_url {
            self.api_base_url = url;
        }
        if let Some(raw) = stale_time_secs {
            self.stale_time_secs =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        name: "stale_time_secs",
                        value: raw.clone(),
                    })?;
        }
        self.validated()
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.stale_time_secs)
    }

    pub fn swr(&self) -> Duration {
        Duration::from_secs(self.swr_secs)
    }

    /// Options every page query runs with.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::new(self.stale_time()).with_retry(self.retry.clone())
    }

    pub fn is_client_loaded(&self, kind: SectionKind) -> bool {
        self.client_sections.contains(&kind)
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        let url = self.api_base_url.trim().trim_end_matches('/').to_string();
        let has_scheme = url.starts_with("http://") || url.starts_with("https://");
        if !has_scheme || url.ends_with("//") {
            return Err(ConfigError::InvalidBaseUrl(self.api_base_url));
        }
        self.api_base_url = url;

        if let Some(bad) = self.avatar.palette.iter().find(|c| !is_hex_color(c)) {
            return Err(ConfigError::InvalidColor(bad.clone()));
        }

        Ok(self)
    }
}

fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_matches_defaults() {
        assert_eq!(PageConfig::bundled().unwrap(), PageConfig::default());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = PageConfig::from_toml_str(
            r#"
api_base_url = "https://api.example.com/"
client_sections = ["reviews"]
ordering = "strict"
"#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.stale_time(), Duration::from_secs(300));
        assert!(config.is_client_loaded(SectionKind::Reviews));
        assert!(!config.is_client_loaded(SectionKind::Sizes));
        assert_eq!(config.ordering.strategy(), OrderingStrategy::Strict);
    }

    #[test]
    fn test_rejects_base_url_without_scheme() {
        let err = PageConfig::from_toml_str(r#"api_base_url = "api.example.com""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));

        let err = PageConfig::from_toml_str(r#"api_base_url = """#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_rejects_bad_palette_colour() {
        let err = PageConfig::from_toml_str(
            r##"
[avatar]
palette = ["#264653", "teal"]
"##,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidColor(c) if c == "teal"));
    }

    #[test]
    fn test_overrides() {
        let config = PageConfig::default()
            .with_overrides(Some("https://catalog.internal".into()), Some("60".into()))
            .unwrap();
        assert_eq!(config.api_base_url, "https://catalog.internal");
        assert_eq!(config.stale_time(), Duration::from_secs(60));

        let err = PageConfig::default()
            .with_overrides(None, Some("soon".into()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "stale_time_secs", .. }));
    }

    #[test]
    fn test_colors_param_strips_hashes() {
        assert_eq!(
            AvatarConfig::default().colors_param(),
            "264653,2a9d8f,e9c46a,f4a261,e76f51"
        );
    }

    #[test]
    fn test_query_options_follow_config() {
        let config = PageConfig {
            stale_time_secs: 10,
            retry: RetryPolicy::none(),
            ..PageConfig::default()
        };
        let options = config.query_options();
        assert_eq!(options.stale_time, Duration::from_secs(10));
        assert_eq!(options.retry, RetryPolicy::none());
    }
}
