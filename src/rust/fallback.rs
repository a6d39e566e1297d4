//! Deterministic keyword advisories used when no trained classifier is available.

/// Returned when none of the keywords appear in the input.
pub const DEFAULT_ADVISORY: &str = "No strong indicators detected — consider consulting a clinician.";

/// Most advisories returned for a single input.
pub const MAX_ADVISORIES: usize = 3;

/// Keyword to advisory message, scanned in this order.
const KEYWORD_ADVISORIES: [(&str, &str); 7] = [
    ("glucose", "Potential elevated blood sugar levels"),
    ("insulin", "Consider diabetes screening"),
    ("anemia", "Possible anemia indicators present"),
    ("hemoglobin", "Check hemoglobin trends"),
    ("cholesterol", "Lipids may be elevated"),
    ("pressure", "Monitor blood pressure closely"),
    ("fatigue", "General fatigue reported"),
];

/// Maps free text to advisory messages by case-insensitive substring match.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackMatcher;

impl FallbackMatcher {
    pub fn new() -> Self {
        Self
    }

    /// The keywords the matcher looks for, in scan order
    pub fn keywords(&self) -> impl Iterator<Item = &'static str> {
        KEYWORD_ADVISORIES.iter().map(|(keyword, _)| *keyword)
    }

    /// Returns between one and [`MAX_ADVISORIES`] messages for `text`.
    ///
    /// ```
    /// use medscan::FallbackMatcher;
    ///
    /// let advice = FallbackMatcher::new().advise("Fasting GLUCOSE 131 mg/dL");
    /// assert_eq!(advice, vec!["Potential elevated blood sugar levels".to_string()]);
    /// ```
    pub fn advise(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut matches: Vec<String> = KEYWORD_ADVISORIES
            .iter()
            .filter(|(keyword, _)| lowered.contains(keyword))
            .take(MAX_ADVISORIES)
            .map(|(_, message)| message.to_string())
            .collect();

        if matches.is_empty() {
            matches.push(DEFAULT_ADVISORY.to_string());
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_returns_default() {
        let matcher = FallbackMatcher::new();
        assert_eq!(matcher.advise("xyz nonsense"), vec![DEFAULT_ADVISORY.to_string()]);
        assert_eq!(matcher.advise(""), vec![DEFAULT_ADVISORY.to_string()]);
    }

    #[test]
    fn test_matches_follow_declaration_order() {
        let matcher = FallbackMatcher::new();
        assert_eq!(
            matcher.advise("insulin was normal but glucose elevated"),
            vec![
                "Potential elevated blood sugar levels".to_string(),
                "Consider diabetes screening".to_string(),
            ]
        );
    }

    #[test]
    fn test_case_insensitive_substring() {
        let matcher = FallbackMatcher::new();
        assert_eq!(
            matcher.advise("HYPERCHOLESTEROLEMIA"),
            vec!["Lipids may be elevated".to_string()]
        );
    }

    #[test]
    fn test_capped_at_three() {
        let matcher = FallbackMatcher::new();
        let advice = matcher.advise("fatigue, low hemoglobin, anemia, high blood pressure, glucose");
        assert_eq!(
            advice,
            vec![
                "Potential elevated blood sugar levels".to_string(),
                "Possible anemia indicators present".to_string(),
                "Check hemoglobin trends".to_string(),
            ]
        );
    }

    #[test]
    fn test_keywords_listed_in_order() {
        let keywords: Vec<_> = FallbackMatcher::new().keywords().collect();
        assert_eq!(keywords.first(), Some(&"glucose"));
        assert_eq!(keywords.len(), 7);
    }
}
