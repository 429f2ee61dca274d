use std::collections::HashSet;
use std::hash::Hash;

/// Tracked anchors grouped by their depth below the root.
///
/// Buckets grow on demand and stay allocated once created; an empty bucket is
/// simply skipped.
#[derive(Debug, Clone)]
pub(crate) struct DepthIndex<N> {
    buckets: Vec<HashSet<N>>,
}

impl<N: Copy + Eq + Hash> DepthIndex<N> {
    pub(crate) fn with_capacity(depths: usize) -> Self {
        Self {
            buckets: Vec::with_capacity(depths),
        }
    }

    pub(crate) fn insert(&mut self, depth: usize, node: N) {
        if self.buckets.len() <= depth {
            self.buckets.resize_with(depth + 1, HashSet::new);
        }
        self.buckets[depth].insert(node);
    }

    pub(crate) fn remove(&mut self, depth: usize, node: N) -> bool {
        self.buckets
            .get_mut(depth)
            .is_some_and(|bucket| bucket.remove(&node))
    }

    pub(crate) fn bucket(&self, depth: usize) -> impl Iterator<Item = N> + '_ {
        self.buckets.get(depth).into_iter().flatten().copied()
    }

    /// One past the deepest level that has ever held an anchor.
    pub(crate) fn depth_limit(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.buckets.iter().map(HashSet::len).sum()
    }

    /// Every (depth, node) pair currently indexed.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (usize, N)> + '_ {
        self.buckets
            .iter()
            .enumerate()
            .flat_map(|(depth, bucket)| bucket.iter().map(move |node| (depth, *node)))
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
    }
}
