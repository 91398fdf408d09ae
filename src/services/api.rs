// src/services/api.rs

//! Authenticated statement tier.

use std::sync::Arc;

use serde_json::json;

use super::rpc::RpcClient;
use crate::models::{BearerToken, LanguageCode, ProblemId};

/// Fetches raw statement fragments and titles through JSON-RPC.
pub struct ApiStatementFetcher {
    rpc: Arc<RpcClient>,
}

impl ApiStatementFetcher {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }

    /// One `problems/getHtmlStatement` call. `None` when there is no token
    /// or the call does not produce a non-empty HTML string.
    pub async fn fetch(
        &self,
        id: &ProblemId,
        lang: &LanguageCode,
        token: Option<&BearerToken>,
    ) -> Option<String> {
        let token = token?;
        let params = json!({ "problem_nm": id.as_str(), "lang": lang.as_str() });
        match self
            .rpc
            .call("problems", "getHtmlStatement", params, Some(token))
            .await
        {
            Ok(result) => result
                .as_str()
                .filter(|html| !html.trim().is_empty())
                .map(str::to_string),
            Err(e) => {
                log::debug!("API statement unavailable for {} ({}): {}", id, lang, e);
                None
            }
        }
    }

    /// Best-effort `problems/getProblem` lookup of `result.title`.
    pub async fn fetch_title(&self, id: &ProblemId, token: Option<&BearerToken>) -> Option<String> {
        let token = token?;
        let params = json!({ "problem_nm": id.as_str() });
        match self.rpc.call("problems", "getProblem", params, Some(token)).await {
            Ok(result) => result
                .get("title")
                .and_then(|t| t.as_str())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            Err(e) => {
                log::debug!("Title lookup failed for {}: {}", id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UpstreamConfig;
    use crate::utils::mock::{Method, MockTransport};

    const STATEMENT: &str = "https://api.jutge.org/api/problems/getHtmlStatement";
    const PROBLEM: &str = "https://api.jutge.org/api/problems/getProblem";

    fn fetcher(mock: MockTransport) -> (Arc<MockTransport>, ApiStatementFetcher) {
        let mock = Arc::new(mock);
        let rpc = Arc::new(RpcClient::new(mock.clone(), &UpstreamConfig::default()));
        (mock, ApiStatementFetcher::new(rpc))
    }

    fn ids() -> (ProblemId, LanguageCode, BearerToken) {
        (
            ProblemId::parse("P37500").unwrap(),
            LanguageCode::parse("ca").unwrap(),
            BearerToken::new("tok").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_no_token_no_call() {
        let (mock, api) = fetcher(MockTransport::new());
        let (id, lang, _) = ids();
        assert!(api.fetch(&id, &lang, None).await.is_none());
        assert!(api.fetch_title(&id, None).await.is_none());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_statement_per_language() {
        let (mock, api) = fetcher(
            MockTransport::new()
                .on_post(STATEMENT, r#""lang":"ca""#, 200, r#"{"result":"<p>hola</p>"}"#)
                .on_post(STATEMENT, r#""lang":"en""#, 200, r#"{"result":""}"#),
        );
        let (id, ca, token) = ids();
        let en = LanguageCode::parse("en").unwrap();

        assert_eq!(
            api.fetch(&id, &ca, Some(&token)).await.as_deref(),
            Some("<p>hola</p>")
        );
        assert!(api.fetch(&id, &en, Some(&token)).await.is_none());
        assert_eq!(mock.count(Method::Post, STATEMENT), 2);
        assert_eq!(
            mock.calls()[0].body.as_ref().unwrap()["params"]["problem_nm"],
            "P37500"
        );
    }

    #[tokio::test]
    async fn test_fetch_title() {
        let (_, api) = fetcher(MockTransport::new().on_post(
            PROBLEM,
            "",
            200,
            r#"{"result":{"title":"Suma de dos enters"}}"#,
        ));
        let (id, _, token) = ids();
        assert_eq!(
            api.fetch_title(&id, Some(&token)).await.as_deref(),
            Some("Suma de dos enters")
        );
    }

    #[tokio::test]
    async fn test_errors_are_unavailable() {
        let (_, api) = fetcher(
            MockTransport::new()
                .on_post(STATEMENT, "", 401, "denied")
                .fail(Method::Post, PROBLEM),
        );
        let (id, lang, token) = ids();
        assert!(api.fetch(&id, &lang, Some(&token)).await.is_none());
        assert!(api.fetch_title(&id, Some(&token)).await.is_none());
    }
}
