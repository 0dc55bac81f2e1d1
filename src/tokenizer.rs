//! Validation input tokenizer.
//!
//! A validation string is a sequence of symbol tokens separated by commas
//! and ASCII whitespace. Any non-empty run of separators is one boundary;
//! there are no empty tokens.

/// Split a validation string into symbol tokens.
///
/// ```
/// use contentmodel::tokenize;
///
/// let tokens: Vec<&str> = tokenize(" a, b\t,,c\n").collect();
/// assert_eq!(tokens, vec!["a", "b", "c"]);
/// ```
pub fn tokenize(input: &str) -> impl Iterator<Item = &str> {
    input
        .split([',', ' ', '\t', '\n', '\r'])
        .filter(|token| !token.is_empty())
}
