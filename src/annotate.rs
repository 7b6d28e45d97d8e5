//! Hashtag highlighting for invitation text.

use regex::Regex;
use std::sync::LazyLock;

pub const HASHTAG_OPEN: &str = r#"<span class="hashtag">"#;
pub const HASHTAG_CLOSE: &str = "</span>";

// A `#` at the start or after a non-word char, then every non-space char up to
// the next space (and therefore the next " #token") or the end.
static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\W)(#\S+)").expect("hashtag pattern is valid"));

/// Wraps every hashtag in `text` in a styling span.
///
/// Apply exactly once per raw text: the output is not a fixed point, a second
/// pass nests the markers.
pub fn annotate(text: &str) -> String {
    HASHTAG
        .replace_all(text, |caps: &regex::Captures| {
            format!("{}{}{}{}", &caps[1], HASHTAG_OPEN, &caps[2], HASHTAG_CLOSE)
        })
        .into_owned()
}
