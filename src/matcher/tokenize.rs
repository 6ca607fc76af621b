//! Word tokenization for keyword matching.

use std::collections::BTreeSet;

/// Ordered set of normalized tokens.
pub type TokenSet = BTreeSet<String>;

/// Tokens shorter than this are dropped as noise.
const MIN_TOKEN_LEN: usize = 2;

const STOP_WORDS: &[&str] = &[
    "an", "and", "are", "as", "at", "be", "by", "can", "do", "for", "from", "how", "in", "into",
    "is", "it", "its", "me", "my", "of", "on", "or", "our", "please", "some", "that", "the",
    "this", "to", "using", "via", "we", "what", "with", "you", "your",
];

/// Tokenize free text: lowercase, split on anything that is not a letter or a
/// digit, drop short tokens and stop words, fold simple plurals.
pub fn tokenize(text: &str) -> TokenSet {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter_map(normalize_token)
        .collect()
}

/// Tokenize an identifier such as a tool name. Like [`tokenize`], but also
/// splits camelCase boundaries (`searchIssues` -> `search`, `issue`).
pub fn tokenize_identifier(identifier: &str) -> TokenSet {
    let mut spaced = String::with_capacity(identifier.len() + 8);
    let mut prev_lower = false;
    for c in identifier.chars() {
        if c.is_uppercase() && prev_lower {
            spaced.push(' ');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        spaced.push(c);
    }
    tokenize(&spaced)
}

fn normalize_token(raw: &str) -> Option<String> {
    if raw.chars().count() < MIN_TOKEN_LEN || STOP_WORDS.contains(&raw) {
        return None;
    }
    Some(fold_plural(raw).to_string())
}

/// `issues` -> `issue`, `files` -> `file`; leaves `status`, `process`, `analysis` alone.
fn fold_plural(token: &str) -> &str {
    if token.len() > 3
        && token.ends_with('s')
        && !token.ends_with("ss")
        && !token.ends_with("us")
        && !token.ends_with("is")
    {
        &token[..token.len() - 1]
    } else {
        token
    }
}
