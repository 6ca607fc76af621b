//! Curated synonym groups for near-miss recovery.
//!
//! Entries are stored in normalized token form (see `tokenize`).

const SYNONYM_GROUPS: &[&[&str]] = &[
    &["search", "find", "lookup", "query", "locate", "seek"],
    &["read", "get", "fetch", "open", "load", "view", "show", "cat", "retrieve"],
    &["write", "save", "store", "put", "persist"],
    &["create", "add", "new", "make", "insert"],
    &["update", "edit", "modify", "change", "patch"],
    &["delete", "remove", "rm", "erase", "drop"],
    &["list", "ls", "enumerate", "browse"],
    &["run", "execute", "exec", "invoke", "launch"],
    &["web", "internet", "online", "website", "page"],
    &["file", "document", "doc"],
    &["directory", "folder", "dir"],
    &["think", "reason", "analyze", "plan"],
];

fn group_of(token: &str) -> Option<usize> {
    SYNONYM_GROUPS
        .iter()
        .position(|group| group.contains(&token))
}

/// True when two distinct tokens belong to the same synonym group.
pub fn are_synonyms(a: &str, b: &str) -> bool {
    if a == b {
        return false;
    }
    match (group_of(a), group_of(b)) {
        (Some(ga), Some(gb)) => ga == gb,
        _ => false,
    }
}
