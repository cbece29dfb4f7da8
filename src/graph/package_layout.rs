//! PackageLayoutPlanner (spec.md §4.5): assigns every component's
//! source directories to a single BUILD-file package directory, via a
//! union-find over directories joined by shared component membership,
//! collapsed to the longest common path prefix per equivalence class.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::graph::scc::Component;

/// Minimal union-find with path compression and union by rank, scoped
/// to this planning pass. Not exposed outside this module; every
/// stage in the pipeline owns its small stateful builders locally
/// (spec.md §5: "shared mutable state is confined to each component's
/// local builders").
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// `plan(components) -> mapping Directory -> PackageDir`.
pub fn plan(components: &[Component]) -> HashMap<PathBuf, PathBuf> {
    let mut dir_index: HashMap<PathBuf, usize> = HashMap::new();
    let mut dirs: Vec<PathBuf> = Vec::new();

    let mut index_of = |dir: &Path, dir_index: &mut HashMap<PathBuf, usize>, dirs: &mut Vec<PathBuf>| -> usize {
        if let Some(&idx) = dir_index.get(dir) {
            return idx;
        }
        let idx = dirs.len();
        dirs.push(dir.to_path_buf());
        dir_index.insert(dir.to_path_buf(), idx);
        idx
    };

    let component_dirs: Vec<Vec<usize>> = components
        .iter()
        .map(|c| {
            let mut idxs: Vec<usize> = c
                .files
                .iter()
                .map(|f| {
                    let dir = f.as_path().parent().unwrap_or_else(|| Path::new(""));
                    index_of(dir, &mut dir_index, &mut dirs)
                })
                .collect();
            idxs.sort_unstable();
            idxs.dedup();
            idxs
        })
        .collect();

    let mut uf = UnionFind::new(dirs.len());
    for idxs in &component_dirs {
        for window in idxs.windows(2) {
            uf.union(window[0], window[1]);
        }
    }

    let mut classes: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..dirs.len() {
        let root = uf.find(i);
        classes.entry(root).or_default().push(i);
    }

    let mut result = HashMap::new();
    for members in classes.values() {
        let paths: Vec<&Path> = members.iter().map(|&i| dirs[i].as_path()).collect();
        let prefix = longest_common_prefix_path(&paths);
        for &i in members {
            result.insert(dirs[i].clone(), prefix.clone());
        }
    }

    result
}

/// The longest path that is a prefix, path-component-wise, of every
/// path given. Not a character-wise prefix: `a/bee` and `a/be` share no
/// common path-component prefix beyond `a`.
fn longest_common_prefix_path(paths: &[&Path]) -> PathBuf {
    let mut iter = paths.iter();
    let Some(first) = iter.next() else {
        return PathBuf::new();
    };
    let mut prefix: Vec<std::path::Component> = first.components().collect();

    for path in iter {
        let components: Vec<std::path::Component> = path.components().collect();
        let common_len = prefix
            .iter()
            .zip(components.iter())
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(common_len);
        if prefix.is_empty() {
            break;
        }
    }

    prefix.iter().collect()
}
