//! Comparison keys for names and document numbers
//!
//! The output of these functions is only ever compared, never stored in place
//! of the display value the operator typed.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical comparison form of a name
///
/// Lowercases, decomposes (NFD), drops combining marks, turns every character
/// that is neither alphanumeric nor whitespace into a space, then collapses
/// whitespace runs and trims. `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps only ASCII digits: `"123.456.789-00"` becomes `"12345678900"`
pub fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// True when two optional document numbers carry the same non-empty digits
pub fn same_document(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.map(digits_only), b.map(digits_only)) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_diacritics_and_case() {
        assert_eq!(normalize("São José"), normalize("sao jose"));
        assert_eq!(normalize("  MARIA   da  Conceição "), "maria da conceicao");
    }

    #[test]
    fn test_normalize_replaces_punctuation() {
        assert_eq!(normalize("D'Ávila-Souza"), "d avila souza");
        assert_eq!(normalize("Sr. João (Pai)"), "sr joao pai");
    }

    #[test]
    fn test_normalize_empty_and_symbols_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("--- ..."), "");
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("123.456.789-00"), "12345678900");
        assert_eq!(digits_only("n/a"), "");
    }

    #[test]
    fn test_same_document_ignores_formatting() {
        assert!(same_document(Some("123.456.789-00"), Some("12345678900")));
        assert!(!same_document(Some(""), Some("")));
        assert!(!same_document(None, Some("1")));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalize_is_idempotent(text in "[a-zA-ZÀ-ÿ0-9 .,'()-]{0,40}") {
            let once = normalize(&text);
            prop_assert_eq!(normalize(&once), once.clone());
        }
    }
}
