//! Implicit binary relation tree over the ranks of a group
//!
//! The tree is never stored. A rank's position is its index relative to the
//! root, `v = (rank - root) mod size`, laid out like a binary heap: children of
//! `v` are `2v + 1` and `2v + 2`, the parent is `(v - 1) / 2`.
use crate::communicator::Rank;

/// parent and children of one rank
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TreeLinks {
    pub parent: Option<Rank>,
    pub left: Option<Rank>,
    pub right: Option<Rank>,
}

impl TreeLinks {
    /// existing children, left first
    pub fn children(&self) -> impl Iterator<Item = Rank> {
        self.left.into_iter().chain(self.right)
    }
}

/// Computes the tree neighbours of `rank` in a group of `size` rooted at `root`
///
/// # Arguments
/// * `rank` the rank to look up, must be below `size`
/// * `root` the rank at the top of the tree, must be below `size`
/// * `size` number of ranks in the group
pub fn tree_links(rank: Rank, root: Rank, size: usize) -> TreeLinks {
    RelationTree::new(root, size).links(rank)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RelationTree {
    root: Rank,
    size: usize,
}

impl RelationTree {
    pub fn new(root: Rank, size: usize) -> Self {
        assert!(root < size, "root {} outside a group of {}", root, size);
        RelationTree { root, size }
    }

    pub fn root(&self) -> Rank {
        self.root
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// heap index of `rank`
    pub fn relative(&self, rank: Rank) -> usize {
        (rank + self.size - self.root) % self.size
    }

    /// rank sitting at heap index `relative`
    pub fn absolute(&self, relative: usize) -> Rank {
        (relative + self.root) % self.size
    }

    pub fn links(&self, rank: Rank) -> TreeLinks {
        let v = self.relative(rank);
        let child = |offset: usize| {
            let c = 2 * v + offset;
            if c < self.size {
                Some(self.absolute(c))
            } else {
                None
            }
        };
        TreeLinks {
            parent: if v == 0 {
                None
            } else {
                Some(self.absolute((v - 1) / 2))
            },
            left: child(1),
            right: child(2),
        }
    }

    /// Every rank in the subtree below `rank`, `rank` included, in ascending heap order
    ///
    /// Level `k` below heap index `v` covers the contiguous heap indices
    /// starting at `(v + 1) * 2^k - 1`, so the subtree is walked level by level.
    pub fn subtree(&self, rank: Rank) -> Vec<Rank> {
        let mut ranks = Vec::new();
        let mut start = self.relative(rank);
        let mut width = 1usize;
        while start < self.size {
            let end = std::cmp::min(start.saturating_add(width), self.size);
            ranks.extend((start..end).map(|v| self.absolute(v)));
            start = match start.checked_mul(2).and_then(|s| s.checked_add(1)) {
                Some(next) => next,
                None => break,
            };
            width = width.saturating_mul(2);
        }
        ranks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_rank() {
        let links = tree_links(0, 0, 1);
        assert_eq!(
            links,
            TreeLinks {
                parent: None,
                left: None,
                right: None
            }
        );
        assert_eq!(RelationTree::new(0, 1).subtree(0), vec![0]);
    }

    #[test]
    fn test_root_zero_is_heap_layout() {
        assert_eq!(
            tree_links(0, 0, 8),
            TreeLinks {
                parent: None,
                left: Some(1),
                right: Some(2)
            }
        );
        assert_eq!(
            tree_links(3, 0, 8),
            TreeLinks {
                parent: Some(1),
                left: Some(7),
                right: None
            }
        );
        assert_eq!(
            tree_links(6, 0, 8),
            TreeLinks {
                parent: Some(2),
                left: None,
                right: None
            }
        );
    }

    #[test]
    fn test_shifted_root() {
        // heap index v sits at rank (v + 2) % 5
        assert_eq!(
            tree_links(2, 2, 5),
            TreeLinks {
                parent: None,
                left: Some(3),
                right: Some(4)
            }
        );
        assert_eq!(
            tree_links(3, 2, 5),
            TreeLinks {
                parent: Some(2),
                left: Some(0),
                right: Some(1)
            }
        );
        assert_eq!(tree_links(1, 2, 5).parent, Some(3));
    }

    #[test]
    fn test_parent_child_consistency() {
        for size in 1..20 {
            for root in 0..size {
                let tree = RelationTree::new(root, size);
                for rank in 0..size {
                    match tree.links(rank).parent {
                        None => assert_eq!(rank, root),
                        Some(parent) => {
                            assert!(tree.links(parent).children().any(|c| c == rank));
                        }
                    }
                    for child in tree.links(rank).children() {
                        assert_eq!(tree.links(child).parent, Some(rank));
                    }
                }
            }
        }
    }

    #[test]
    fn test_subtrees_partition_group() {
        for size in 1..20 {
            for root in 0..size {
                let tree = RelationTree::new(root, size);
                let mut all = tree.subtree(root);
                all.sort_unstable();
                assert_eq!(all, (0..size).collect::<Vec<_>>());

                for rank in 0..size {
                    let subtree = tree.subtree(rank);
                    assert_eq!(subtree[0], rank);
                    let mut below = vec![rank];
                    for child in tree.links(rank).children() {
                        below.extend(tree.subtree(child));
                    }
                    below.sort_unstable();
                    let mut sorted = subtree.clone();
                    sorted.sort_unstable();
                    assert_eq!(sorted, below);
                    // ascending heap order
                    assert!(subtree
                        .windows(2)
                        .all(|w| tree.relative(w[0]) < tree.relative(w[1])));
                }
            }
        }
    }

    #[test]
    fn test_subtree_spans_levels() {
        let tree = RelationTree::new(0, 12);
        assert_eq!(tree.subtree(1), vec![1, 3, 4, 7, 8, 9, 10]);
        assert_eq!(tree.subtree(2), vec![2, 5, 6, 11]);
    }
}
