// src/pipeline/resolve.rs

//! Statement resolution pipeline.
//!
//! `INIT -> TRY_API -> TRY_SCRAPE -> TRY_SCRAPE_BARE -> NORMALIZE`. The
//! first tier and language that produce a fragment win; nothing at all is
//! `ContentNotFound`.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{
    BearerToken, Config, LanguageCode, ProblemId, ResolutionResult, StatementSource,
    UpstreamConfig,
};
use crate::services::{
    ApiStatementFetcher, CredentialAcquirer, Normalizer, RpcClient, ScrapeStatementFetcher,
    language_order,
};
use crate::utils::http::{ReqwestTransport, Transport};

/// State of one resolution. Never shared between requests.
#[derive(Debug)]
struct ResolutionContext {
    id: ProblemId,
    languages: Vec<LanguageCode>,
    token: Option<BearerToken>,
    title: Option<String>,
    fragment: Option<String>,
    source: StatementSource,
    available_languages: Vec<LanguageCode>,
}

impl ResolutionContext {
    fn new(id: ProblemId, languages: Vec<LanguageCode>) -> Self {
        Self {
            id,
            languages,
            token: None,
            title: None,
            fragment: None,
            source: StatementSource::Error,
            available_languages: Vec::new(),
        }
    }

    fn found(&self) -> bool {
        self.fragment.is_some()
    }
}

/// Resolves problem ids into normalized statements.
///
/// Holds only configuration, fetchers and the optional token cache, so one
/// instance can serve concurrent requests.
pub struct Resolver {
    upstream: UpstreamConfig,
    default_order: Vec<String>,
    acquirer: CredentialAcquirer,
    api: ApiStatementFetcher,
    scrape: ScrapeStatementFetcher,
    normalizer: Normalizer,
}

impl Resolver {
    pub fn new(config: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let rpc = Arc::new(RpcClient::new(Arc::clone(&transport), &config.upstream));
        Ok(Self {
            upstream: config.upstream.clone(),
            default_order: config.languages.default_order.clone(),
            acquirer: CredentialAcquirer::new(Arc::clone(&rpc), &config.auth),
            api: ApiStatementFetcher::new(rpc),
            scrape: ScrapeStatementFetcher::new(transport, config)?,
            normalizer: Normalizer::new(config)?,
        })
    }

    /// Build a resolver that talks to the real upstream.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.upstream)?;
        Self::new(config, Arc::new(transport))
    }

    pub fn upstream(&self) -> &UpstreamConfig {
        &self.upstream
    }

    /// Resolve `raw_id` in the preferred language `lang`.
    pub async fn resolve(&self, raw_id: &str, lang: Option<&str>) -> Result<ResolutionResult> {
        let id = ProblemId::parse(raw_id)?;
        let requested = lang.and_then(LanguageCode::parse);
        let languages = language_order(requested.as_ref(), &self.default_order);
        log::info!(
            "Resolving {} (trial order: {})",
            id,
            languages.iter().map(|l| l.as_str()).collect::<Vec<_>>().join(", ")
        );

        let mut ctx = ResolutionContext::new(id, languages);
        ctx.token = self.acquirer.acquire_token().await;

        self.try_api(&mut ctx).await;
        if !ctx.found() && ctx.token.is_some() {
            self.acquirer.invalidate();
        }
        if !ctx.found() {
            self.try_scrape(&mut ctx).await;
        }
        if !ctx.found() {
            self.try_scrape_bare(&mut ctx).await;
        }

        let Some(fragment) = ctx.fragment.take() else {
            log::warn!("No statement found for {}", ctx.id);
            return Err(AppError::ContentNotFound {
                id: ctx.id.to_string(),
            });
        };

        let statement = self.normalizer.normalize(&fragment, &ctx.id);
        log::info!("Resolved {} via {}", ctx.id, ctx.source.as_str());
        Ok(ResolutionResult {
            title: ctx.title.unwrap_or_else(|| ctx.id.to_string()),
            url: self.upstream.problem_url(ctx.id.as_str()),
            id: ctx.id,
            statement,
            source: ctx.source,
            available_languages: ctx.available_languages,
        })
    }

    /// Error envelope for `raw_id`, pointing at its canonical page.
    pub fn placeholder(&self, raw_id: &str) -> Result<ResolutionResult> {
        let id = ProblemId::parse(raw_id)?;
        let url = self.upstream.problem_url(id.as_str());
        Ok(ResolutionResult::placeholder(id, url))
    }

    async fn try_api(&self, ctx: &mut ResolutionContext) {
        let Some(token) = ctx.token.as_ref() else {
            log::debug!("No API token; skipping API tier");
            return;
        };

        for lang in &ctx.languages {
            if let Some(html) = self.api.fetch(&ctx.id, lang, Some(token)).await {
                log::debug!("API statement found for {} in {}", ctx.id, lang);
                ctx.title = self.api.fetch_title(&ctx.id, Some(token)).await;
                ctx.fragment = Some(html);
                ctx.source = StatementSource::ApiOfficial;
                ctx.available_languages = language_order(None, &self.default_order);
                return;
            }
        }
        log::info!("API tier produced nothing for {}", ctx.id);
    }

    async fn try_scrape(&self, ctx: &mut ResolutionContext) {
        for lang in &ctx.languages {
            if let Some(scraped) = self.scrape.fetch(&ctx.id, Some(lang), ctx.token.as_ref()).await {
                log::debug!("Scraped statement for {} in {}", ctx.id, lang);
                ctx.title = scraped.title;
                ctx.fragment = Some(scraped.html);
                ctx.source = StatementSource::ScrapingFallback;
                ctx.available_languages = scraped.languages;
                return;
            }
        }
    }

    async fn try_scrape_bare(&self, ctx: &mut ResolutionContext) {
        if let Some(scraped) = self.scrape.fetch(&ctx.id, None, ctx.token.as_ref()).await {
            log::debug!("Scraped statement for {} from the bare page", ctx.id);
            ctx.title = scraped.title;
            ctx.fragment = Some(scraped.html);
            ctx.source = StatementSource::ScrapingFallback;
            ctx.available_languages = scraped.languages;
        }
    }
}
