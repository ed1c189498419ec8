//! Main test module for the hashtree library
//!
//! This target includes all black-box test suites:
//! - Integration tests for larger build/merge/diff scenarios
//! - Property-based tests for invariants

pub mod integration;

#[cfg(test)]
mod edge_cases {
    use ::hashtree::*;

    fn obj(hash: &str) -> ObjectRef {
        ObjectRef::new(hash)
    }

    #[test]
    fn test_fresh_tree_has_root() {
        let mut open = OpenHashTree::new();
        let tree = open.finish().unwrap();
        let root = tree.get("/").unwrap();
        assert!(root.is_dir());
        assert_eq!(tree.fs_size(), 0);
    }

    #[test]
    fn test_path_spellings_are_equivalent() {
        let mut open = OpenHashTree::new();
        open.put_file("a//b/./c/", vec![obj("h1")], 1).unwrap();

        let tree = open.finish().unwrap();
        assert!(tree.get("/a/b/c").unwrap().is_file());
        assert!(tree.get("a/b/c").unwrap().is_file());
        assert!(tree.get("/a/b/../b/c").unwrap().is_file());
    }

    #[test]
    fn test_put_file_twice_appends_not_replaces() {
        let mut open = OpenHashTree::new();
        open.put_file("/f", vec![obj("h1")], 1).unwrap();
        open.put_file("/f", vec![obj("h2")], 1).unwrap();
        let tree = open.finish().unwrap();
        assert_eq!(tree.get("/f").unwrap().as_file().unwrap().objects.len(), 2);
    }

    #[test]
    fn test_delete_root_of_empty_tree() {
        let mut open = OpenHashTree::new();
        open.delete_file("/").unwrap();
        let tree = open.finish().unwrap();
        assert_eq!(tree.fs_size(), 0);
        assert!(tree.get("/").unwrap().is_dir());
    }

    #[test]
    fn test_glob_star_on_bare_root() {
        let mut open = OpenHashTree::new();
        let tree = open.finish().unwrap();
        assert!(tree.glob("*").unwrap().is_empty());
    }

    #[test]
    fn test_glob_alternation_and_class() {
        let mut open = OpenHashTree::new();
        open.put_file("/data/a1", vec![obj("h1")], 1).unwrap();
        open.put_file("/data/a2", vec![obj("h2")], 1).unwrap();
        open.put_file("/data/b1", vec![obj("h3")], 1).unwrap();
        let tree = open.finish().unwrap();

        assert_eq!(tree.glob("/data/a[12]").unwrap().len(), 2);
        assert_eq!(tree.glob("/data/{a1,b1}").unwrap().len(), 2);
        assert_eq!(tree.glob("/data/?1").unwrap().len(), 2);
    }

    #[test]
    fn test_glob_star_does_not_cross_directories() {
        let mut open = OpenHashTree::new();
        open.put_file("/top/nested/deep", vec![obj("h1")], 1).unwrap();
        let tree = open.finish().unwrap();

        assert!(tree.glob("/*").unwrap().contains_key("/top"));
        assert!(!tree.glob("/*").unwrap().contains_key("/top/nested"));
        assert!(tree.glob("/*/*/*").unwrap().contains_key("/top/nested/deep"));
    }

    #[test]
    fn test_unicode_names() {
        let mut open = OpenHashTree::new();
        open.put_file("/données/été.txt", vec![obj("h1")], 1).unwrap();
        open.put_file("/données/automne.txt", vec![obj("h2")], 1).unwrap();
        let tree = open.finish().unwrap();

        let names: Vec<String> = tree
            .list("/données")
            .unwrap()
            .iter()
            .map(|n| n.name.clone())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(tree.get("/données").unwrap().subtree_size, 2);
    }

    #[test]
    fn test_list_on_missing_and_on_file() {
        let mut open = OpenHashTree::new();
        open.put_file("/f", vec![obj("h1")], 1).unwrap();
        let tree = open.finish().unwrap();

        assert_eq!(
            tree.list("/missing").unwrap_err().kind(),
            ErrorKind::PathNotFound
        );
        assert_eq!(tree.list("/f").unwrap_err().kind(), ErrorKind::PathConflict);
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 200;
        let path: String = (0..depth).map(|i| format!("/d{i}")).collect();
        let mut open = OpenHashTree::new();
        open.put_file(&path, vec![obj("h1")], 1).unwrap();
        let tree = open.finish().unwrap();

        assert_eq!(tree.fs_size(), 1);
        assert!(tree.get(&path).unwrap().is_file());
        assert_eq!(tree.get("/d0").unwrap().subtree_size, 1);

        let mut count = 0;
        tree.walk("/", |_, _| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, depth + 1); // root, every directory level, the file
    }

    #[test]
    fn test_merge_result_reopens_cleanly() {
        let mut a = OpenHashTree::new();
        a.put_file("/x", vec![obj("h1")], 1).unwrap();
        let a = a.finish().unwrap();

        let mut out = OpenHashTree::new();
        out.merge(&[a]).unwrap();
        let sealed = out.finish().unwrap();

        let mut reopened = sealed.open();
        reopened.put_file("/y", vec![obj("h2")], 2).unwrap();
        let resealed = reopened.finish().unwrap();
        assert_eq!(resealed.fs_size(), 3);
    }
}
