//! Catalog text cleanup and contributor display.
//!
//! Titles, names, and notes arrive with MARC artifacts: subfield markers
//! (`$a`, `$b`), spaced punctuation, curly quotes, and trailing title
//! separators. Everything user-facing passes through [`clean`] before a
//! crosswalk emits it.

use once_cell::sync::Lazy;
use regex::Regex;

static MARC_SUBFIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$[a-z]").unwrap());
static MARC_SPACED_SEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\n ](,|:)([A-Za-z0-9])").unwrap());
static CURLY_SINGLE: Lazy<Regex> = Lazy::new(|| Regex::new("[\u{2018}\u{2019}]").unwrap());
static CURLY_DOUBLE: Lazy<Regex> = Lazy::new(|| Regex::new("[\u{201c}\u{201d}]").unwrap());
static TITLE_SPLITTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[;:]\s*").unwrap());
static PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*\)").unwrap());
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static UPDATED_TRAILER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[Uu]pdated?:\s*.*$").unwrap());

/// Strip MARC subfield markers and rejoin punctuation split across them.
pub fn strip_marc_subfields(text: &str) -> String {
    let text = MARC_SUBFIELD.replace_all(text, "");
    let text = MARC_SPACED_SEP.replace_all(&text, "${1} ${2}");
    text.trim().to_string()
}

/// Straighten curly quotes and normalize `;`/`:` title separators.
pub fn normalize_text(text: &str) -> String {
    let text = CURLY_SINGLE.replace_all(text, "'");
    let text = CURLY_DOUBLE.replace_all(&text, "\"");
    let text = TITLE_SPLITTER.replace_all(&text, ": ");
    text.trim_end_matches([':', ' ']).trim().to_string()
}

/// Standard cleanup applied to every displayed field.
pub fn clean(text: &str) -> String {
    normalize_text(&strip_marc_subfields(text))
}

/// Credits additionally drop the "Updated:" trailer and everything after.
pub fn clean_credits(text: &str) -> String {
    UPDATED_TRAILER.replace_all(&clean(text), "").trim().to_string()
}

/// Oxford-comma join: `["Tom", "Dick", "Harry"]` -> `"Tom, Dick, and Harry"`.
pub fn strunk(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

/// `"Twain, Mark"` -> `"Mark Twain"`, dropping parenthesized qualifiers.
pub fn reverse_name(name: &str) -> String {
    let mut parts = name.split(", ").collect::<Vec<_>>();
    parts.reverse();
    let reversed = parts.join(" ");
    let reversed = PARENS.replace_all(&reversed, "");
    MULTI_SPACE.replace_all(&reversed, " ").trim().to_string()
}

fn role_is_implicit(role: &str) -> bool {
    matches!(role.to_lowercase().as_str(), "author" | "creator" | "aut" | "cre")
}

/// One contributor line. `pretty` gives `"Mark Twain [Editor]"`, otherwise
/// the formal `"Twain, Mark [Editor]"`. Author-like roles stay unbracketed.
pub fn contributor_line(name: &str, role: &str, pretty: bool) -> String {
    if name.is_empty() {
        return String::new();
    }
    let display = if pretty { reverse_name(name) } else { clean(name) };
    if role.is_empty() || role_is_implicit(role) {
        display
    } else {
        format!("{display} [{role}]")
    }
}
