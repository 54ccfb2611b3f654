use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::data::dataset::DataRow;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(.*?)\}\}").expect("placeholder pattern is valid")
});

/// Replace every `{{field}}` in `text` with the row's value for `field`.
///
/// Missing rows, missing fields and null values all resolve to the empty
/// string. Only well-formed `{{...}}` tokens match, so stray braces are kept
/// as literal text. Replacement happens in a single pass: values inserted
/// from the row are never themselves expanded.
pub fn substitute(text: &str, row: Option<&DataRow>) -> String {
    substitute_cow(text, row).into_owned()
}

/// Like [`substitute`] but borrows `text` when it contains no placeholder.
pub fn substitute_cow<'a>(text: &'a str, row: Option<&DataRow>) -> Cow<'a, str> {
    PLACEHOLDER.replace_all(text, |caps: &Captures| {
        let field = caps[1].trim();
        row.and_then(|r| r.get(field)).unwrap_or("").to_string()
    })
}

/// Field names referenced by `text`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().trim()))
        .collect()
}
