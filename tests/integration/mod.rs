//! Integration tests for the hashtree library
//!
//! Larger scenarios: bulk builds, wide merges, cross-commit diffs, and
//! persistence of generated trees.

use ::hashtree::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Deterministic generator of file layouts for bulk scenarios
pub struct FileGenerator {
    rng: StdRng,
}

impl FileGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `count` distinct (path, object hash, size) triples spread
    /// over a shallow directory layout
    pub fn files(&mut self, count: usize) -> Vec<(String, String, i64)> {
        (0..count)
            .map(|i| {
                let dir = self.rng.random_range(0..16);
                let size = self.rng.random_range(1..4096);
                (
                    format!("/dir_{dir}/file_{i}.dat"),
                    format!("obj-{i:08x}"),
                    size,
                )
            })
            .collect()
    }
}

fn build_tree(files: &[(String, String, i64)]) -> HashTree {
    let mut open = OpenHashTree::new();
    for (path, hash, size) in files {
        open.put_file(path, vec![ObjectRef::new(hash.as_str())], *size)
            .unwrap();
    }
    open.finish().unwrap()
}

#[test]
fn test_bulk_build_sizes_and_lookups() {
    let mut generator = FileGenerator::new(42);
    let files = generator.files(2000);
    let tree = build_tree(&files);

    let expected_total: i64 = files.iter().map(|(_, _, size)| size).sum();
    assert_eq!(tree.fs_size(), expected_total);

    for (path, hash, size) in &files {
        let node = tree.get(path).unwrap();
        assert_eq!(node.subtree_size, *size);
        assert_eq!(node.as_file().unwrap().objects[0].hash, *hash);
    }
}

#[test]
fn test_bulk_build_matches_incremental_reseal() {
    let mut generator = FileGenerator::new(7);
    let files = generator.files(300);

    // All puts, one seal
    let all_at_once = build_tree(&files);

    // Seal after every hundred puts; the final tree must hash identically
    let mut open = OpenHashTree::new();
    for (i, (path, hash, size)) in files.iter().enumerate() {
        open.put_file(path, vec![ObjectRef::new(hash.as_str())], *size)
            .unwrap();
        if i % 100 == 99 {
            open.finish().unwrap();
        }
    }
    let incremental = open.finish().unwrap();

    assert_eq!(all_at_once.root_hash(), incremental.root_hash());
}

#[test]
fn test_wide_merge_of_sharded_trees() {
    // Each shard owns one unique file in a shared output directory; this is
    // the layout the reverse-index grouping exists for
    let shard_count = 200;
    let shards: Vec<HashTree> = (0..shard_count)
        .map(|i| {
            let mut open = OpenHashTree::new();
            open.put_file(
                &format!("/out/shard-{i:05}"),
                vec![ObjectRef::new(format!("obj-{i}"))],
                1,
            )
            .unwrap();
            open.finish().unwrap()
        })
        .collect();

    let mut merged = OpenHashTree::new();
    merged.merge(&shards).unwrap();
    let merged = merged.finish().unwrap();

    let out = merged.get("/out").unwrap();
    assert_eq!(out.as_dir().unwrap().children.len(), shard_count);
    assert_eq!(out.subtree_size, shard_count as i64);

    // Every shard's object appears exactly once
    for i in 0..shard_count {
        let node = merged.get(&format!("/out/shard-{i:05}")).unwrap();
        let objects = &node.as_file().unwrap().objects;
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].hash, format!("obj-{i}"));
    }
}

#[test]
fn test_merge_order_matters_only_for_object_order() {
    // Two merge orders of the same shards: object lists inside shared files
    // differ, but the set of paths is identical
    let t1 = {
        let mut open = OpenHashTree::new();
        open.put_file("/shared", vec![ObjectRef::new("a")], 1).unwrap();
        open.finish().unwrap()
    };
    let t2 = {
        let mut open = OpenHashTree::new();
        open.put_file("/shared", vec![ObjectRef::new("b")], 1).unwrap();
        open.finish().unwrap()
    };

    let mut forward = OpenHashTree::new();
    forward.merge(&[t1.clone(), t2.clone()]).unwrap();
    let forward = forward.finish().unwrap();

    let mut backward = OpenHashTree::new();
    backward.merge(&[t2, t1]).unwrap();
    let backward = backward.finish().unwrap();

    let forward_objects: Vec<String> = forward
        .get("/shared")
        .unwrap()
        .as_file()
        .unwrap()
        .objects
        .iter()
        .map(|o| o.hash.clone())
        .collect();
    let backward_objects: Vec<String> = backward
        .get("/shared")
        .unwrap()
        .as_file()
        .unwrap()
        .objects
        .iter()
        .map(|o| o.hash.clone())
        .collect();

    assert_eq!(forward_objects, vec!["a", "b"]);
    assert_eq!(backward_objects, vec!["b", "a"]);
    assert_ne!(forward.root_hash(), backward.root_hash());
    assert_eq!(forward.fs_size(), backward.fs_size());
}

#[test]
fn test_diff_finds_exactly_the_mutations() {
    let mut generator = FileGenerator::new(3);
    let files = generator.files(100);
    let v1 = build_tree(&files);

    let mut open = v1.open();
    // Overwrite one file, delete another, add a third
    let (changed_path, _, changed_size) = files[10].clone();
    open.put_file_overwrite(&changed_path, vec![ObjectRef::new("rewritten")], Some(0), 0)
        .unwrap();
    let (deleted_path, _, _) = files[20].clone();
    open.delete_file(&deleted_path).unwrap();
    open.put_file("/fresh.txt", vec![ObjectRef::new("new")], 9).unwrap();
    let v2 = open.finish().unwrap();

    let mut added: BTreeMap<String, i64> = BTreeMap::new();
    let mut removed: BTreeMap<String, i64> = BTreeMap::new();
    v2.diff(&v1, "/", "/", -1, &mut |path, node, is_new| {
        if is_new {
            added.insert(path.to_string(), node.subtree_size);
        } else {
            removed.insert(path.to_string(), node.subtree_size);
        }
        Ok(())
    })
    .unwrap();

    let mut expected_added = vec![changed_path.clone(), "/fresh.txt".to_string()];
    expected_added.sort();
    assert_eq!(added.keys().cloned().collect::<Vec<_>>(), expected_added);

    let mut expected_removed = vec![changed_path.clone(), deleted_path.clone()];
    expected_removed.sort();
    assert_eq!(removed.keys().cloned().collect::<Vec<_>>(), expected_removed);

    assert_eq!(added[&changed_path], changed_size);
}

#[test]
fn test_persistence_of_generated_tree() {
    let mut generator = FileGenerator::new(99);
    let tree = build_tree(&generator.files(500));

    let bytes = tree.serialize().unwrap();
    let decoded = HashTree::deserialize(&bytes).unwrap();

    assert_eq!(tree, decoded);
    assert_eq!(tree.root_hash(), decoded.root_hash());

    // The decoded tree is fully usable
    let mut open = decoded.open();
    open.put_file("/after/restore", vec![ObjectRef::new("x")], 1).unwrap();
    assert_eq!(open.finish().unwrap().fs_size(), tree.fs_size() + 1);
}

#[test]
fn test_glob_against_generated_layout() {
    let mut generator = FileGenerator::new(5);
    let files = generator.files(400);
    let tree = build_tree(&files);

    // Pattern results agree with a straight filter over the layout
    let matches = tree.glob("/dir_3/*").unwrap();
    let expected = files
        .iter()
        .filter(|(path, _, _)| path.starts_with("/dir_3/"))
        .count();
    assert_eq!(matches.len(), expected);
    assert!(matches.keys().all(|p| p.starts_with("/dir_3/")));
}
