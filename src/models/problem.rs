//! Problem identifiers and language tags.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Keep only the characters that are safe inside URL paths and RPC params.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// A sanitized problem identifier (`[A-Za-z0-9_]+`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(String);

impl ProblemId {
    /// Sanitize a raw identifier. Fails when nothing usable remains.
    pub fn parse(raw: &str) -> Result<Self> {
        let clean = sanitize(raw);
        if clean.is_empty() {
            return Err(AppError::InvalidId(raw.to_string()));
        }
        Ok(Self(clean))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Page id for the scrape tier: `<id>_<lang>`, or the bare id.
    pub fn page_id(&self, lang: Option<&LanguageCode>) -> String {
        match lang {
            Some(lang) => format!("{}_{}", self.0, lang),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A short language tag such as `ca` or `en`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Sanitize a requested language; empty input means "none requested".
    pub fn parse(raw: &str) -> Option<Self> {
        let clean = sanitize(raw.trim());
        (!clean.is_empty()).then_some(Self(clean))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
