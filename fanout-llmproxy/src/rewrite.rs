//! Per-provider tables that turn recognizable raw API errors into clearer
//! user-facing messages. Anything a table does not match passes through.

#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Exact machine-readable code from the error envelope.
    Code(&'static str),
    /// Substring of the raw message.
    Contains(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct RewriteRule {
    pub matcher: Matcher,
    pub message: &'static str,
}

impl RewriteRule {
    const fn code(code: &'static str, message: &'static str) -> Self {
        Self {
            matcher: Matcher::Code(code),
            message,
        }
    }

    const fn contains(needle: &'static str, message: &'static str) -> Self {
        Self {
            matcher: Matcher::Contains(needle),
            message,
        }
    }

    fn matches(&self, code: Option<&str>, raw: &str) -> bool {
        match self.matcher {
            Matcher::Code(expected) => code == Some(expected),
            Matcher::Contains(needle) => raw.contains(needle),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RewriteTable {
    rules: &'static [RewriteRule],
}

impl RewriteTable {
    pub const fn new(rules: &'static [RewriteRule]) -> Self {
        Self { rules }
    }

    /// First matching rule wins.
    pub fn rewrite(&self, code: Option<&str>, raw: &str) -> String {
        self.rules
            .iter()
            .find(|rule| rule.matches(code, raw))
            .map(|rule| rule.message.to_string())
            .unwrap_or_else(|| raw.to_string())
    }
}

const GROQ_INVALID_KEY: &str = "Invalid Groq key. Check that it starts with 'gsk_'.";
const GROQ_DECOMMISSIONED: &str = "This Groq model has been decommissioned. Pick another model.";
const GROQ_UNKNOWN_MODEL: &str = "Unknown Groq model, or this key has no access to it.";

const GROQ_RULES: &[RewriteRule] = &[
    RewriteRule::code("invalid_api_key", GROQ_INVALID_KEY),
    RewriteRule::contains("API key", GROQ_INVALID_KEY),
    RewriteRule::code("model_decommissioned", GROQ_DECOMMISSIONED),
    RewriteRule::contains("decommissioned", GROQ_DECOMMISSIONED),
    RewriteRule::code("model_not_found", GROQ_UNKNOWN_MODEL),
    RewriteRule::contains("does not exist", GROQ_UNKNOWN_MODEL),
];

pub const GROQ: RewriteTable = RewriteTable::new(GROQ_RULES);

const GEMINI_INVALID_KEY: &str = "Invalid Gemini key. Check it in your settings.";
const GEMINI_NO_MODEL: &str = "Gemini model not found or not enabled for this key.";
const GEMINI_NO_ACCESS: &str = "This Gemini key has no access to the requested model.";

const GEMINI_RULES: &[RewriteRule] = &[
    RewriteRule::contains("API key not valid", GEMINI_INVALID_KEY),
    RewriteRule::code("PERMISSION_DENIED", GEMINI_NO_ACCESS),
    RewriteRule::code("NOT_FOUND", GEMINI_NO_MODEL),
    RewriteRule::contains("is not found for API version", GEMINI_NO_MODEL),
    RewriteRule::contains("is not supported for generateContent", GEMINI_NO_MODEL),
];

pub const GEMINI: RewriteTable = RewriteTable::new(GEMINI_RULES);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groq_key_errors_are_rewritten() {
        assert_eq!(
            GROQ.rewrite(Some("invalid_api_key"), "whatever"),
            GROQ_INVALID_KEY
        );
        assert_eq!(GROQ.rewrite(None, "Invalid API key provided"), GROQ_INVALID_KEY);
    }

    #[test]
    fn groq_model_errors_are_rewritten() {
        assert_eq!(
            GROQ.rewrite(
                Some("model_decommissioned"),
                "The model `llama3-70b-8192` has been decommissioned"
            ),
            GROQ_DECOMMISSIONED
        );
        assert_eq!(
            GROQ.rewrite(None, "The model `foo` does not exist or you do not have access to it."),
            GROQ_UNKNOWN_MODEL
        );
    }

    #[test]
    fn unknown_errors_pass_through() {
        let raw = "Rate limit reached for model in organization";
        assert_eq!(GROQ.rewrite(Some("rate_limit_exceeded"), raw), raw);
        assert_eq!(GEMINI.rewrite(Some("RESOURCE_EXHAUSTED"), "Quota exceeded"), "Quota exceeded");
    }

    #[test]
    fn gemini_patterns() {
        assert_eq!(
            GEMINI.rewrite(Some("INVALID_ARGUMENT"), "API key not valid. Please pass a valid API key."),
            GEMINI_INVALID_KEY
        );
        assert_eq!(
            GEMINI.rewrite(
                Some("NOT_FOUND"),
                "models/gemini-9 is not found for API version v1beta"
            ),
            GEMINI_NO_MODEL
        );
        assert_eq!(GEMINI.rewrite(Some("PERMISSION_DENIED"), "denied"), GEMINI_NO_ACCESS);
        assert_eq!(
            GEMINI.rewrite(
                Some("INVALID_ARGUMENT"),
                "models/gemini-pro is not supported for generateContent"
            ),
            GEMINI_NO_MODEL
        );
    }

    #[test]
    fn gemini_unrelated_not_found_passes_through() {
        let raw = "Project credentials not found. Check the API key setup.";
        assert_eq!(GEMINI.rewrite(Some("INVALID_ARGUMENT"), raw), raw);
        assert_eq!(GEMINI.rewrite(None, "Requested resource not supported"), "Requested resource not supported");
    }
}
