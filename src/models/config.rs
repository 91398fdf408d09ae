//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream hosts and HTTP behavior
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Credentials and token lifetime
    #[serde(default)]
    pub auth: AuthConfig,

    /// Language trial order
    #[serde(default)]
    pub languages: LanguageConfig,

    /// Scrape tier extraction rules
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Markup rewriting rules
    #[serde(default)]
    pub normalize: NormalizeConfig,

    /// Cache hint emitted with successful responses
    #[serde(default)]
    pub cache: CacheConfig,

    /// Local development server
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.upstream.user_agent.trim().is_empty() {
            return Err(AppError::validation("upstream.user_agent is empty"));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(AppError::validation("upstream.timeout_secs must be > 0"));
        }
        for (field, value) in [
            ("upstream.site_url", &self.upstream.site_url),
            ("upstream.api_url", &self.upstream.api_url),
        ] {
            let parsed = url::Url::parse(value)
                .map_err(|e| AppError::validation(format!("{field} is not a URL: {e}")))?;
            if parsed.cannot_be_a_base() {
                return Err(AppError::validation(format!("{field} cannot be a base URL")));
            }
        }
        if self.languages.default_order.is_empty() {
            return Err(AppError::validation("languages.default_order is empty"));
        }
        if self.scrape.candidate_selectors.is_empty() {
            return Err(AppError::validation("scrape.candidate_selectors is empty"));
        }
        for selector in self
            .scrape
            .candidate_selectors
            .iter()
            .chain([&self.scrape.chrome_selector, &self.normalize.strip_selector])
        {
            scraper::Selector::parse(selector)
                .map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        if let TokenPolicy::Cached { ttl_secs: 0 } = self.auth.token_policy {
            return Err(AppError::validation("auth.token_policy ttl_secs must be > 0"));
        }
        Ok(())
    }
}

/// Upstream hosts and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Public site; problem pages live under `{site_url}/problems/`
    #[serde(default = "defaults::site_url")]
    pub site_url: String,

    /// JSON-RPC base; calls go to `{api_url}/{module}/{method}`
    #[serde(default = "defaults::api_url")]
    pub api_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Raw cookie forwarded on every JSON-RPC call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_cookie: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            site_url: defaults::site_url(),
            api_url: defaults::api_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            api_cookie: None,
        }
    }
}

impl UpstreamConfig {
    /// Canonical page URL for a problem, optionally language-suffixed.
    pub fn problem_url(&self, page_id: &str) -> String {
        format!("{}/problems/{}", self.site_url.trim_end_matches('/'), page_id)
    }

    /// JSON-RPC endpoint for `module/method`.
    pub fn rpc_url(&self, module: &str, method: &str) -> String {
        format!("{}/{}/{}", self.api_url.trim_end_matches('/'), module, method)
    }
}

/// Credentials and token lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default)]
    pub token_policy: TokenPolicy,
}

/// How long an acquired bearer token is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum TokenPolicy {
    /// Log in again for every resolution
    #[default]
    PerRequest,
    /// Reuse one token until it is older than `ttl_secs` or invalidated
    Cached { ttl_secs: u64 },
}

/// Language trial settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Fallback priority appended after the requested language
    #[serde(default = "defaults::default_order")]
    pub default_order: Vec<String>,

    /// Codes recognised when scanning a page for language variants
    #[serde(default = "defaults::known_languages")]
    pub known: Vec<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default_order: defaults::default_order(),
            known: defaults::known_languages(),
        }
    }
}

/// Scrape tier extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Statement containers, tried in order; first match wins
    #[serde(default = "defaults::candidate_selectors")]
    pub candidate_selectors: Vec<String>,

    /// Headings, controls and navigation removed from the statement
    #[serde(default = "defaults::chrome_selector")]
    pub chrome_selector: String,

    /// Body substrings marking a login wall or an invalid-URL page
    #[serde(default = "defaults::unavailable_markers")]
    pub unavailable_markers: Vec<String>,

    /// Cookie name used to forward the bearer token as a session
    #[serde(default = "defaults::session_cookie")]
    pub session_cookie: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            candidate_selectors: defaults::candidate_selectors(),
            chrome_selector: defaults::chrome_selector(),
            unavailable_markers: defaults::unavailable_markers(),
            session_cookie: defaults::session_cookie(),
        }
    }
}

/// Markup rewriting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Scripts, styles and navigation dropped from every statement
    #[serde(default = "defaults::strip_selector")]
    pub strip_selector: String,

    /// Classes for a plain anchor without images
    #[serde(default = "defaults::text_link_class")]
    pub text_link_class: String,

    /// Classes for an anchor wrapping an image
    #[serde(default = "defaults::image_link_class")]
    pub image_link_class: String,

    /// Classes for a content image
    #[serde(default = "defaults::content_image_class")]
    pub content_image_class: String,

    /// Classes for the badge icon
    #[serde(default = "defaults::icon_class")]
    pub icon_class: String,

    /// `src` fragments identifying legacy file icons, matched case-insensitively
    #[serde(default = "defaults::legacy_icon_markers")]
    pub legacy_icon_markers: Vec<String>,

    /// Lowercased URL fragments identifying links to drop
    #[serde(default = "defaults::trash_markers")]
    pub trash_markers: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            strip_selector: defaults::strip_selector(),
            text_link_class: defaults::text_link_class(),
            image_link_class: defaults::image_link_class(),
            content_image_class: defaults::content_image_class(),
            icon_class: defaults::icon_class(),
            legacy_icon_markers: defaults::legacy_icon_markers(),
            trash_markers: defaults::trash_markers(),
        }
    }
}

/// Freshness hint for an external caching layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "defaults::max_age")]
    pub max_age_secs: u64,

    #[serde(default = "defaults::stale_while_revalidate")]
    pub stale_while_revalidate_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_secs: defaults::max_age(),
            stale_while_revalidate_secs: defaults::stale_while_revalidate(),
        }
    }
}

impl CacheConfig {
    /// `Cache-Control` value for CDN-fronted responses.
    pub fn header_value(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            self.max_age_secs, self.stale_while_revalidate_secs
        )
    }
}

/// Local development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::bind(),
        }
    }
}

mod defaults {
    // Upstream defaults
    pub fn site_url() -> String {
        "https://jutge.org".into()
    }
    pub fn api_url() -> String {
        "https://api.jutge.org/api".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; ApuntsBot/1.0)".into()
    }
    pub fn timeout() -> u64 {
        15
    }

    // Language defaults
    pub fn default_order() -> Vec<String> {
        vec!["ca".into(), "en".into(), "es".into()]
    }
    pub fn known_languages() -> Vec<String> {
        vec![
            "ca".into(),
            "en".into(),
            "es".into(),
            "fr".into(),
            "de".into(),
        ]
    }

    // Scrape defaults
    pub fn candidate_selectors() -> Vec<String> {
        vec![
            "#txt".into(),
            ".statement-section".into(),
            ".problem-statement".into(),
            ".enunciat".into(),
            ".panel-body".into(),
        ]
    }
    pub fn chrome_selector() -> String {
        "h1, button, script, style, nav, header, footer, .navbar, .breadcrumb, \
         #header, #footer, .ui-layout-north, .ui-layout-south, .left-panel, .right-panel"
            .into()
    }
    pub fn unavailable_markers() -> Vec<String> {
        vec!["Login".into(), "Wrong URL".into()]
    }
    pub fn session_cookie() -> String {
        "PHPSESSID".into()
    }

    // Normalize defaults
    pub fn strip_selector() -> String {
        "script, style, noscript, nav, header, footer, .navbar, .breadcrumb, #header, \
         #footer, .ui-layout-north, .ui-layout-south, .left-panel, .right-panel"
            .into()
    }
    pub fn text_link_class() -> String {
        "text-emerald-400 hover:text-emerald-300 underline underline-offset-4 \
         decoration-emerald-500/30 transition-colors"
            .into()
    }
    pub fn image_link_class() -> String {
        "inline-block no-underline".into()
    }
    pub fn content_image_class() -> String {
        "content-image block max-w-full h-auto rounded-lg my-6 shadow-md border \
         border-white/10 mx-auto"
            .into()
    }
    pub fn icon_class() -> String {
        "mr-1.5".into()
    }
    pub fn legacy_icon_markers() -> Vec<String> {
        vec![
            "/icons/".into(),
            "ico_".into(),
            "icon_".into(),
            "f_pdf".into(),
            "f_zip".into(),
            "zip.png".into(),
            "pdf.png".into(),
        ]
    }
    pub fn trash_markers() -> Vec<String> {
        vec!["trashurl".into()]
    }

    // Cache defaults
    pub fn max_age() -> u64 {
        86_400
    }
    pub fn stale_while_revalidate() -> u64 {
        604_800
    }

    // Server defaults
    pub fn bind() -> String {
        "127.0.0.1:5173".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.upstream.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.scrape.candidate_selectors = vec!["[[invalid".to_string()];
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_ttl() {
        let mut config = Config::default();
        config.auth.token_policy = TokenPolicy::Cached { ttl_secs: 0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [upstream]
            timeout_secs = 5

            [auth]
            email = "a@b.c"
            token_policy = { mode = "cached", ttl_secs = 600 }
            "#,
        )
        .unwrap();
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(config.upstream.site_url, "https://jutge.org");
        assert_eq!(config.auth.token_policy, TokenPolicy::Cached { ttl_secs: 600 });
        assert_eq!(config.languages.default_order, vec!["ca", "en", "es"]);
    }

    #[test]
    fn problem_and_rpc_urls() {
        let upstream = UpstreamConfig {
            site_url: "https://jutge.org/".into(),
            ..UpstreamConfig::default()
        };
        assert_eq!(
            upstream.problem_url("P37500_ca"),
            "https://jutge.org/problems/P37500_ca"
        );
        assert_eq!(
            upstream.rpc_url("auth", "login"),
            "https://api.jutge.org/api/auth/login"
        );
    }

    #[test]
    fn cache_header_value() {
        assert_eq!(
            CacheConfig::default().header_value(),
            "public, s-maxage=86400, stale-while-revalidate=604800"
        );
    }
}
