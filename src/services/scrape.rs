// src/services/scrape.rs

//! Public page statement tier.
//!
//! Fetches `{site}/problems/{id}[_{lang}]`, picks the statement container
//! and strips page chrome from it.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{BearerToken, Config, LanguageCode, ProblemId, UpstreamConfig};
use crate::utils::dedup_ordered;
use crate::utils::dom::{Fragment, KEEP_WHEN_EMPTY};
use crate::utils::http::Transport;

static H1_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("BUG: hardcoded CSS selector 'h1' is invalid"));

static PROBLEM_LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href*="/problems/"]"#)
        .expect("BUG: hardcoded CSS selector for problem links is invalid")
});

static LANGUAGE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_/]([a-z]{2})$").expect("BUG: language suffix regex is invalid"));

/// Statement fragment extracted from a problem page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedStatement {
    pub html: String,
    pub title: Option<String>,
    pub languages: Vec<LanguageCode>,
}

/// True when the page is a login wall or an invalid-URL page.
pub fn is_unavailable_page(body: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| !m.is_empty() && body.contains(m.as_str()))
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))
}

/// Scrapes statements from the public problem pages.
pub struct ScrapeStatementFetcher {
    transport: Arc<dyn Transport>,
    upstream: UpstreamConfig,
    candidates: Vec<Selector>,
    chrome: Selector,
    unavailable_markers: Vec<String>,
    session_cookie: String,
    known_languages: Vec<String>,
}

impl ScrapeStatementFetcher {
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Result<Self> {
        let candidates = config
            .scrape
            .candidate_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            transport,
            upstream: config.upstream.clone(),
            candidates,
            chrome: parse_selector(&config.scrape.chrome_selector)?,
            unavailable_markers: config.scrape.unavailable_markers.clone(),
            session_cookie: config.scrape.session_cookie.clone(),
            known_languages: config.languages.known.clone(),
        })
    }

    /// Fetch one page variant. Any failure is logged and reported as `None`.
    pub async fn fetch(
        &self,
        id: &ProblemId,
        lang: Option<&LanguageCode>,
        token: Option<&BearerToken>,
    ) -> Option<ScrapedStatement> {
        match self.try_fetch(id, lang, token).await {
            Ok(scraped) => Some(scraped),
            Err(e) => {
                log::debug!("{}", e);
                None
            }
        }
    }

    async fn try_fetch(
        &self,
        id: &ProblemId,
        lang: Option<&LanguageCode>,
        token: Option<&BearerToken>,
    ) -> Result<ScrapedStatement> {
        let page_id = id.page_id(lang);
        let url = self.upstream.problem_url(&page_id);
        let context = format!("scrape {page_id}");

        let cookie = token.map(|t| format!("{}={}", self.session_cookie, t.as_str()));
        let mut headers: Vec<(&str, &str)> = vec![("User-Agent", self.upstream.user_agent.as_str())];
        if let Some(cookie) = &cookie {
            headers.push(("Cookie", cookie.as_str()));
        }

        let response = self.transport.get(&url, &headers).await?;
        if !response.is_success() {
            return Err(AppError::upstream(context, format!("status {}", response.status)));
        }
        if is_unavailable_page(&response.body, &self.unavailable_markers) {
            return Err(AppError::upstream(context, "login wall or invalid URL"));
        }

        self.extract(&response.body, id, lang)
            .ok_or_else(|| AppError::upstream(context, "no statement content"))
    }

    /// Pull the statement, title and language variants out of a page.
    pub fn extract(
        &self,
        page: &str,
        id: &ProblemId,
        lang: Option<&LanguageCode>,
    ) -> Option<ScrapedStatement> {
        let document = Html::parse_document(page);
        let container = self
            .candidates
            .iter()
            .find_map(|selector| document.select(selector).next())?;

        let mut fragment = Fragment::from_children(container, Some(&self.chrome));
        fragment.prune_empty(KEEP_WHEN_EMPTY, |_| false);
        if fragment.is_blank() {
            return None;
        }

        Some(ScrapedStatement {
            html: fragment.to_html(),
            title: extract_title(&document, container, id),
            languages: self.detect_languages(&document, lang),
        })
    }

    fn detect_languages(&self, document: &Html, requested: Option<&LanguageCode>) -> Vec<LanguageCode> {
        let detected = document
            .select(&PROBLEM_LINK_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| {
                let path = href.split(['?', '#']).next().unwrap_or(href);
                let code = LANGUAGE_SUFFIX.captures(path.trim())?.get(1)?.as_str();
                self.known_languages
                    .iter()
                    .any(|k| k == code)
                    .then(|| LanguageCode::parse(code))
                    .flatten()
            });

        let fallback = requested
            .cloned()
            .or_else(|| LanguageCode::parse("en"));
        dedup_ordered(detected.chain(fallback))
    }
}

/// First `h1` outside the statement container, without its leading
/// `<id>.` prefix.
fn extract_title(document: &Html, container: ElementRef<'_>, id: &ProblemId) -> Option<String> {
    let heading = document
        .select(&H1_SELECTOR)
        .find(|h1| !h1.ancestors().any(|a| a.id() == container.id()))?;
    let text = heading.text().collect::<String>();
    let title = strip_id_prefix(text.trim(), id.as_str()).trim().to_string();
    (!title.is_empty()).then_some(title)
}

fn strip_id_prefix<'a>(text: &'a str, id: &str) -> &'a str {
    match text.get(..id.len()) {
        Some(head) if head.eq_ignore_ascii_case(id) => {
            let rest = &text[id.len()..];
            rest.strip_prefix('.').unwrap_or(rest)
        }
        _ => text,
    }
}
