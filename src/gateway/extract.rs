//! Code extraction from a model response.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::extract::MIN_CODE_LENGTH;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:javascript|js|strudel)?\n?(.*?)```").expect("static regex is valid")
});

/// Returns the first fenced code region whose trimmed content exceeds
/// [`MIN_CODE_LENGTH`] characters.
///
/// Length is counted in Unicode scalar values (`chars()`), not bytes or
/// UTF-16 units, so an emoji counts once.
///
/// Fences are matched sequentially and never overlap. `None` is a normal
/// outcome (prose-only or malformed responses).
pub fn extract_code(text: &str) -> Option<&str> {
    CODE_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|code| code.chars().count() > MIN_CODE_LENGTH)
}
