//! Scrub access tokens out of strings before they are printed or logged.
//!
//! Tokens travel in query strings (`?token=...`, `&access_token=...`) and
//! show up verbatim in request URLs and HTTP client error messages.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Matches `token=<value>` and `access_token=<value>` query parameters.
static TOKEN_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b((?:access_)?token=)[^&\s#]+").expect("token regex must compile")
});

/// Replace every token query value with `***`.
pub fn redact_tokens(text: &str) -> Cow<'_, str> {
    TOKEN_PARAM_RE.replace_all(text, "${1}***")
}
