use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static URL_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:[/-])([a-fA-F0-9]{32}|[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12})(?:[/?#]|$)",
    )
    .expect("Failed to compile Notion ID regex - this is a bug in the code")
});

/// A remote Notion object id in canonical hyphenated lowercase form
/// (`8-4-4-4-12`).
///
/// Config files and URLs carry ids in several shapes; every id that reaches
/// the gateway or the store has been normalized through `NotionId::parse`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotionId(String);

impl NotionId {
    /// Parses a bare 32-hex id, a hyphenated UUID, or a Notion URL ending in one.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let cleaned = input.trim().trim_end_matches('/');
        if cleaned.is_empty() {
            return Err(ValidationError::EmptyField("notion id"));
        }

        let compact = cleaned.replace('-', "");
        if compact.len() == 32 && compact.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Self::from_hex(&compact));
        }

        if cleaned.contains("notion") {
            return Self::extract_from_url(cleaned);
        }

        Err(ValidationError::InvalidId(format!(
            "expected 32 hex characters, got '{}'",
            input
        )))
    }

    fn from_hex(hex: &str) -> Self {
        let hex = hex.to_lowercase();
        NotionId(format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        ))
    }

    fn extract_from_url(url: &str) -> Result<Self, ValidationError> {
        URL_ID_PATTERN
            .captures(url)
            .and_then(|captures| captures.get(1))
            .map(|m| Self::from_hex(&m.as_str().replace('-', "")))
            .ok_or_else(|| ValidationError::InvalidId(format!("no valid id found in URL: {}", url)))
    }

    /// The hyphenated form used by the API and as the store key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 32-character form without hyphens.
    pub fn to_compact(&self) -> String {
        self.0.replace('-', "")
    }
}

impl fmt::Display for NotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NotionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NotionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NotionId::parse(&s).map_err(serde::de::Error::custom)
    }
}
