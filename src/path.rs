//! Canonical path handling
//!
//! Every path stored in a tree map is in one canonical form: absolute,
//! forward-slash delimited, no trailing slash, with the root represented as
//! the empty string. Callers hand in `"/"`-style paths; [`clean`] is the
//! single entry point that maps them onto the canonical form, and the other
//! helpers assume their inputs are already canonical.

/// Canonicalize a path
///
/// Collapses `.` and `..` components, duplicate slashes, and trailing
/// slashes, and anchors the result at the root. `..` components that would
/// climb above the root are dropped. The root itself — reachable from `"/"`,
/// `""`, `"."`, or any equivalent spelling — canonicalizes to the empty
/// string.
///
/// # Example
///
/// ```
/// use hashtree::path::clean;
///
/// assert_eq!(clean("/"), "");
/// assert_eq!(clean("a/b"), "/a/b");
/// assert_eq!(clean("/a//b/./c/../d/"), "/a/b/d");
/// ```
pub fn clean(path: &str) -> String {
    let mut components: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            c => components.push(c),
        }
    }
    if components.is_empty() {
        String::new()
    } else {
        let mut out = String::with_capacity(path.len());
        for c in components {
            out.push('/');
            out.push_str(c);
        }
        out
    }
}

/// Join a canonical parent path and a basename
///
/// `join("", "a")` is `"/a"`; `join("/a", "b")` is `"/a/b"`.
pub fn join(parent: &str, name: &str) -> String {
    let mut out = String::with_capacity(parent.len() + name.len() + 1);
    out.push_str(parent);
    out.push('/');
    out.push_str(name);
    out
}

/// Split a canonical path into its parent path and basename
///
/// The root splits into `("", "")`; everything else splits at the final
/// slash, with the top level splitting into the root parent: `split("/a")`
/// is `("", "a")`.
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// The basename of a canonical path; empty for the root
pub fn base(path: &str) -> &str {
    split(path).1
}
