use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Same character classes as `char::is_alphanumeric`.
    static ref RE: Regex = Regex::new(r"[\p{Alphabetic}\p{N}]+").expect("valid regex");
}

/// Tokenize text into lowercase terms, splitting on every run of non-alphanumeric characters.
pub fn tokenize(text: &str) -> Vec<String> {
    RE.find_iter(text)
        .map(|mat| mat.as_str().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}
