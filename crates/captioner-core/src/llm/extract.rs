//! JSON extraction from free-form model output.
//!
//! Models wrap structured output in markdown fences or surround it with
//! prose. [`extract_json`] returns the substring most likely to parse, and
//! never fails: validity is decided by the parse step that follows.

const TAGGED_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Last-resort strategy applied when the text is not fenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Return the trimmed text unchanged
    None,
    /// Take everything from the first `{` to the last `}` inclusive
    OutermostBraces,
}

/// Extract the JSON payload from a model response.
///
/// Rules, in priority order:
/// 1. text starting with ```` ```json ````: content up to the next fence
/// 2. text starting with ```` ``` ````: content between the first two fences
/// 3. with [`Fallback::OutermostBraces`]: first `{` through last `}`
/// 4. otherwise the trimmed text
pub fn extract_json(text: &str, fallback: Fallback) -> &str {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix(TAGGED_FENCE) {
        return until_fence(rest);
    }
    if let Some(rest) = text.strip_prefix(FENCE) {
        return until_fence(rest);
    }

    if fallback == Fallback::OutermostBraces {
        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if start < end {
                return &text[start..=end];
            }
        }
    }

    text
}

/// Content before the next fence (or the rest of the text if unterminated), trimmed.
fn until_fence(rest: &str) -> &str {
    let body = match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    };
    body.trim()
}
