//! Locale tags of the form `language-REGION`

use crate::error::SpeechError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_TAG_LENGTH: usize = 35;

/// Language and region taken from a hyphenated locale tag.
///
/// Only the first two subtags are kept, so `zh-Hant-TW` yields language
/// `zh` and region `Hant`. Case is preserved as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    pub language: String,
    pub region: String,
}

impl Locale {
    pub fn new(language: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            region: region.into(),
        }
    }

    pub fn parse(tag: &str) -> Result<Self, SpeechError> {
        if tag.len() > MAX_TAG_LENGTH {
            return Err(SpeechError::InvalidOptions(format!(
                "locale too long (max {} chars)",
                MAX_TAG_LENGTH
            )));
        }

        let mut parts = tag.split('-');
        let language = parts.next().unwrap_or_default();
        let region = parts.next().ok_or_else(|| {
            SpeechError::InvalidOptions(format!(
                "locale '{}' must look like language-REGION",
                tag
            ))
        })?;

        for (name, part) in [("language", language), ("region", region)] {
            if part.is_empty() {
                return Err(SpeechError::InvalidOptions(format!(
                    "locale '{}' has an empty {}",
                    tag, name
                )));
            }
            if !part.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(SpeechError::InvalidOptions(format!(
                    "locale '{}' has an invalid {}",
                    tag, name
                )));
            }
        }

        Ok(Self::new(language, region))
    }
}

impl FromStr for Locale {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.language, self.region)
    }
}
