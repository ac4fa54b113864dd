//! Heuristic intent detection.
//!
//! Classifies a free-text message into "needs a lookup" plus the argument
//! for that lookup. The keyword detector is a best-effort heuristic: it is
//! the reference behavior for tests, not a language-understanding component,
//! and it sits behind [`IntentDetector`] so it can be swapped out without
//! touching orchestration.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Tool name the keyword detector emits.
pub const WEATHER_TOOL: &str = "weather";

/// Terms that mark a message as weather-related. Matched as substrings of
/// the lower-cased message.
const WEATHER_KEYWORDS: &[&str] = &[
    "weather",
    "temperature",
    "temp",
    "forecast",
    "rain",
    "sunny",
    "cloudy",
    "humidity",
    "wind",
    "climate",
    "hot",
    "cold",
    "warm",
    "cool",
];

/// Location templates, tried in order. The first one whose capture group
/// matches wins.
static LOCATION_TEMPLATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:weather|temperature|temp|forecast|climate)\s+in\s+([^?.!]+)",
        r"(?i)(?:weather|temperature|temp|forecast|climate)\s+for\s+([^?.!]+)",
        r"(?i)(?:weather|temperature|temp|forecast|climate)\s+at\s+([^?.!]+)",
        r"(?i)(?:what's|what\s+is)\s+the\s+(?:weather|temperature|temp)\s+in\s+([^?.!]+)",
        r"(?i)(?:how's|how\s+is)\s+the\s+(?:weather|temperature|temp)\s+in\s+([^?.!]+)",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("location template is a valid regex"))
    .collect()
});

/// Capitalized-name fallbacks. Case-sensitive on purpose: capitalization is
/// the only signal left once the templates have failed.
static CAPITALIZED_FALLBACKS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:weather|temperature|temp)\s.*?([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)",
        r"in\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("fallback pattern is a valid regex"))
    .collect()
});

/// A detected need for an external lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Name of the tool that should handle the lookup.
    pub tool: String,
    /// Non-empty argument for the tool.
    pub argument: String,
}

impl Intent {
    /// Creates a new intent.
    #[must_use]
    pub fn new(tool: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            argument: argument.into(),
        }
    }
}

/// Classifies text into an optional tool intent.
pub trait IntentDetector: Send + Sync {
    /// Returns the intent implied by `text`, if any. A returned intent always
    /// carries a non-empty argument.
    fn detect(&self, text: &str) -> Option<Intent>;
}

/// Keyword and pattern based weather detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordIntentDetector;

impl KeywordIntentDetector {
    /// Creates the detector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns true if the text mentions any weather keyword.
    #[must_use]
    pub fn is_weather_query(text: &str) -> bool {
        let lower = text.to_lowercase();
        WEATHER_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
    }

    /// Extracts the location a weather question is about.
    ///
    /// Returns `None` when neither the templates nor the capitalized-name
    /// fallback produce a non-empty location.
    #[must_use]
    pub fn extract_location(text: &str) -> Option<String> {
        let templated = LOCATION_TEMPLATES
            .iter()
            .find_map(|template| template.captures(text)?.get(1))
            .map(|capture| clean_location(capture.as_str()));

        let location = match templated {
            Some(location) => location,
            None => CAPITALIZED_FALLBACKS
                .iter()
                .find_map(|pattern| {
                    pattern
                        .captures_iter(text)
                        .filter_map(|captures| captures.get(1))
                        .last()
                })
                .map(|capture| capture.as_str().trim().to_string())?,
        };

        (!location.is_empty()).then_some(location)
    }
}

fn clean_location(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| matches!(c, '?' | '.' | '!') || c.is_whitespace())
        .to_string()
}

impl IntentDetector for KeywordIntentDetector {
    fn detect(&self, text: &str) -> Option<Intent> {
        if !Self::is_weather_query(text) {
            return None;
        }
        Self::extract_location(text).map(|location| Intent::new(WEATHER_TOOL, location))
    }
}
