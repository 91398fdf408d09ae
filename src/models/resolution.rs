//! The response envelope produced by one resolution.

use serde::{Deserialize, Serialize};

use super::{LanguageCode, ProblemId};

/// Which tier produced the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatementSource {
    ApiOfficial,
    ScrapingFallback,
    Error,
}

impl StatementSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementSource::ApiOfficial => "api-official",
            StatementSource::ScrapingFallback => "scraping-fallback",
            StatementSource::Error => "error",
        }
    }
}

/// A resolved, normalized statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub id: ProblemId,
    pub title: String,
    /// Normalized HTML fragment
    pub statement: String,
    /// Canonical problem page
    pub url: String,
    pub source: StatementSource,
    pub available_languages: Vec<LanguageCode>,
}

impl ResolutionResult {
    /// Envelope shown in place of a statement that could not be loaded.
    pub fn placeholder(id: ProblemId, url: String) -> Self {
        let statement = format!(
            "<div class=\"p-4 bg-red-900/20 border border-red-500/50 rounded-lg text-red-200\">\
             <p class=\"font-bold\">No s'ha pogut carregar l'enunciat.</p>\
             <p class=\"text-sm opacity-80 mt-2\">Verifica les credencials del servidor (JUTGE_EMAIL).</p>\
             <a href=\"{url}\" target=\"_blank\" class=\"block mt-4 text-emerald-400 hover:underline\">\
             Veure a Jutge.org &rarr;</a></div>"
        );
        Self {
            title: format!("Error carregant {id}"),
            id,
            statement,
            url,
            source: StatementSource::Error,
            available_languages: Vec::new(),
        }
    }
}
