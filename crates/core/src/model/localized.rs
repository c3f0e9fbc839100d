use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interface language. Bangla and English are the only supported pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Bn,
    #[default]
    En,
}

impl Language {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::Bn => "bn",
            Language::En => "en",
        }
    }

    /// Guess the language of free text.
    ///
    /// Any character in the Bengali block (U+0980..=U+09FF) makes the text
    /// Bangla; everything else, including empty input, is English.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        if text.chars().any(|c| ('\u{0980}'..='\u{09FF}').contains(&c)) {
            Language::Bn
        } else {
            Language::En
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a language code is not `bn` or `en`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code: {0}")]
pub struct ParseLanguageError(String);

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bn" => Ok(Language::Bn),
            "en" => Ok(Language::En),
            other => Err(ParseLanguageError(other.to_owned())),
        }
    }
}

/// A Bangla/English string pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocalizedText {
    pub bn: String,
    pub en: String,
}

impl LocalizedText {
    #[must_use]
    pub fn new(bn: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            bn: bn.into(),
            en: en.into(),
        }
    }

    /// Text for `lang`, falling back to the other language when empty.
    #[must_use]
    pub fn get(&self, lang: Language) -> &str {
        let (preferred, other) = match lang {
            Language::Bn => (&self.bn, &self.en),
            Language::En => (&self.en, &self.bn),
        };
        if preferred.is_empty() { other } else { preferred }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_bangla_script() {
        assert_eq!(Language::detect("আমি চাকরি চাই"), Language::Bn);
        assert_eq!(Language::detect("job ম্যাচ"), Language::Bn);
        assert_eq!(Language::detect("find me a job"), Language::En);
        assert_eq!(Language::detect("   "), Language::En);
    }

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("BN".parse::<Language>().unwrap(), Language::Bn);
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn localized_text_falls_back_when_missing() {
        let text = LocalizedText::new("", "Safety basics");
        assert_eq!(text.get(Language::Bn), "Safety basics");
        assert_eq!(text.get(Language::En), "Safety basics");

        let text = LocalizedText::new("নিরাপত্তা", "Safety");
        assert_eq!(text.get(Language::Bn), "নিরাপত্তা");
    }
}
