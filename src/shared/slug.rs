use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_ALPHANUMERIC_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Derive a URL-safe slug from a category name.
///
/// Lowercases the name, collapses every run of non `[a-z0-9]` characters into a
/// single hyphen and strips hyphens from both ends. Non-ASCII letters count as
/// separators, so the result may be empty for names without any ASCII
/// alphanumerics.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_ALPHANUMERIC_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
