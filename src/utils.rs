//! Small text and path helpers shared by the engine and the CLI.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static JSX_ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").unwrap());

/// Named entities that show up in hand-written JSX copy.
const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("middot", '\u{b7}'),
    ("hellip", '\u{2026}'),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("ldquo", '\u{201c}'),
    ("rdquo", '\u{201d}'),
    ("copy", '\u{a9}'),
    ("reg", '\u{ae}'),
    ("trade", '\u{2122}'),
];

/// Checks if the text contains at least one Unicode alphabetic character.
///
/// # Examples
///
/// ```
/// use twrap::utils::contains_alphabetic;
///
/// assert!(contains_alphabetic("안녕"));
/// assert!(contains_alphabetic("Save 2"));
/// assert!(!contains_alphabetic("1,000"));
/// assert!(!contains_alphabetic(""));
/// ```
pub fn contains_alphabetic(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// Normalize JSX text the way React renders it: each line trimmed, blank
/// lines dropped, the rest joined by one space.
pub fn collapse_jsx_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode the HTML entities JSX text may contain, the way React renders
/// them.
///
/// Returns `None` for a named entity outside the known set, since its
/// rendered text cannot be reproduced reliably.
///
/// ```
/// use twrap::utils::decode_jsx_entities;
///
/// assert_eq!(decode_jsx_entities("A &amp; B").as_deref(), Some("A & B"));
/// assert_eq!(decode_jsx_entities("&#54620;").as_deref(), Some("한"));
/// assert_eq!(decode_jsx_entities("&unknownentity;"), None);
/// ```
pub fn decode_jsx_entities(text: &str) -> Option<String> {
    if !text.contains('&') {
        return Some(text.to_string());
    }

    let mut unknown = false;
    let decoded = JSX_ENTITY_REGEX.replace_all(text, |caps: &Captures| {
        let entity = &caps[1];
        let decoded = match entity.strip_prefix('#') {
            Some(num) => match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse::<u32>().ok(),
            }
            .and_then(char::from_u32),
            None => NAMED_ENTITIES
                .iter()
                .find(|(name, _)| *name == entity)
                .map(|(_, c)| *c),
        };
        match decoded {
            Some(c) => c.to_string(),
            None => {
                unknown = true;
                caps[0].to_string()
            }
        }
    });

    (!unknown).then(|| decoded.into_owned())
}

/// `path` relative to `root` with forward slashes, or `path` itself when it
/// lies outside `root`.
pub fn relative_slash_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
