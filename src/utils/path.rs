//! ## path
//!
//! Conversions between SMB share-relative paths and slash separated paths

/// Split an SMB path (`dir\file`) into its non-empty components
pub fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split(['\\', '/']).filter(|c| !c.is_empty())
}

/// Join components with `\`, the separator expected by the SMB primitives
pub fn join_smb<'a, I: IntoIterator<Item = &'a str>>(parts: I) -> String {
    parts
        .into_iter()
        .flat_map(components)
        .collect::<Vec<&str>>()
        .join("\\")
}

/// Convert an SMB share-relative path to an absolute slash separated path.
///
/// The share root (empty path) becomes `/`.
pub fn to_slash(path: &str) -> String {
    let mut out = String::from("/");
    out.push_str(&components(path).collect::<Vec<&str>>().join("/"));
    out
}
