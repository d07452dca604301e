use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating category slugs
    /// Must be lowercase alphanumeric with single hyphens between segments
    /// - Valid: "teknoloji", "web-tasarim", "seo2024"
    /// - Invalid: "-web", "web-", "web--tasarim", "Web", "web_tasarim"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_regex_valid() {
        assert!(SLUG_REGEX.is_match("teknoloji"));
        assert!(SLUG_REGEX.is_match("web-tasarim"));
        assert!(SLUG_REGEX.is_match("seo2024"));
        assert!(SLUG_REGEX.is_match("a"));
        assert!(SLUG_REGEX.is_match("a-b-c"));
    }

    #[test]
    fn test_slug_regex_invalid() {
        assert!(!SLUG_REGEX.is_match("-web")); // starts with hyphen
        assert!(!SLUG_REGEX.is_match("web-")); // ends with hyphen
        assert!(!SLUG_REGEX.is_match("web--tasarim")); // double hyphen
        assert!(!SLUG_REGEX.is_match("Web")); // uppercase
        assert!(!SLUG_REGEX.is_match("web_tasarim")); // underscore
        assert!(!SLUG_REGEX.is_match("")); // empty
        assert!(!SLUG_REGEX.is_match("web tasarim")); // space
    }
}
