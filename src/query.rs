//! Read operations over the flat tree map
//!
//! Both tree flavors — open and finished — are views over the same
//! `path -> Node` map, so the read operations live here as free functions
//! and the tree types delegate. None of these mutate; all of them accept
//! caller-spelled paths and canonicalize internally.

use crate::collections::HashMap;
use crate::error::{HashTreeError, Result};
use crate::path::{clean, join};
use crate::types::Node;
use globset::{GlobBuilder, GlobMatcher};
use tracing::trace;

/// The flat tree representation shared by open and finished trees
pub(crate) type FsMap = HashMap<String, Node>;

/// Characters whose presence makes a pattern a glob rather than a literal path
const GLOB_METACHARS: &[char] = &['*', '?', '[', ']', '{', '}', '!'];

/// Whether `pattern` contains any glob metacharacter
pub(crate) fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_METACHARS)
}

/// Compile a shell-style pattern into a matcher over canonical paths
///
/// `/` is the path delimiter: `*` and `?` never match across it, so
/// `/data/*` matches `/data/x` but not `/data/x/y`.
pub(crate) fn compile(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| HashTreeError::MalformedGlob(e.to_string()))
}

/// Look up the node at `path`
pub(crate) fn get<'a>(fs: &'a FsMap, path: &str) -> Result<&'a Node> {
    let path = clean(path);
    fs.get(&path)
        .ok_or_else(|| HashTreeError::path_not_found(path))
}

/// List the children of the directory at `path`, in sorted child order
pub(crate) fn list<'a>(fs: &'a FsMap, path: &str) -> Result<Vec<&'a Node>> {
    let path = clean(path);
    let node = get(fs, &path)?;
    let dir = node.as_dir().ok_or_else(|| {
        HashTreeError::path_conflict(format!("the file at \"{path}\" is not a directory"))
    })?;
    dir.children
        .iter()
        .map(|child| {
            let childpath = join(&path, child);
            fs.get(&childpath).ok_or_else(|| {
                HashTreeError::internal(format!(
                    "no node for the child \"{childpath}\" while listing \"{path}\""
                ))
            })
        })
        .collect()
}

/// All (path, node) pairs matching `pattern`
///
/// A pattern without metacharacters degrades to an exact lookup, so a miss
/// is `PathNotFound`; a real glob that matches nothing yields an empty map.
/// Keys are canonical, which means a pattern resolving to the root yields
/// the key `""`.
pub(crate) fn glob<'a>(fs: &'a FsMap, pattern: &str) -> Result<HashMap<String, &'a Node>> {
    if !is_glob(pattern) {
        let node = get(fs, pattern)?;
        let mut res = HashMap::default();
        res.insert(clean(pattern), node);
        return Ok(res);
    }

    // Bare "*" must work even though stored paths all start with "/", so the
    // pattern goes through the same canonicalization as paths do.
    let pattern = clean(pattern);
    let matcher = compile(&pattern)?;

    let mut res = HashMap::default();
    for (path, node) in fs {
        if matcher.is_match(path.as_str()) {
            res.insert(path.clone(), node);
        }
    }
    trace!(pattern = %pattern, matches = res.len(), "glob");
    Ok(res)
}

/// Total byte count of the tree; zero when there is no root entry
pub(crate) fn fs_size(fs: &FsMap) -> i64 {
    fs.get("").map(|root| root.subtree_size).unwrap_or(0)
}

/// Visit the subtree rooted at `path`
///
/// A file path gets exactly one visit. A directory path gets a visit for
/// itself and every descendant, in unspecified order; the root is presented
/// to the visitor as `"/"`. A visitor error stops the walk and propagates.
pub(crate) fn walk<F>(fs: &FsMap, path: &str, visitor: &mut F) -> Result<()>
where
    F: FnMut(&str, &Node) -> Result<()>,
{
    let path = clean(path);
    match fs.get(&path) {
        None => return Err(HashTreeError::path_not_found(path)),
        Some(node) if node.is_file() => return visitor(&path, node),
        Some(_) => {}
    }
    for (node_path, node) in fs {
        if !is_under(&path, node_path) {
            continue;
        }
        let shown = if node_path.is_empty() { "/" } else { node_path };
        visitor(shown, node)?;
    }
    Ok(())
}

/// Component-wise prefix test: `/a` covers `/a` and `/a/b` but never `/ab`
fn is_under(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
