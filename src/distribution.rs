use collective::Rank;

/// How the rows of an `n x n` matrix are split across a group
///
/// Every rank gets `n / procs` rows except the root, which also takes the
/// `n % procs` leftover rows. Blocks are contiguous and laid out in rank order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RowDistribution {
    n: usize,
    procs: usize,
    root: Rank,
    quotient: usize,
    remainder: usize,
}

impl RowDistribution {
    pub fn new(n: usize, procs: usize, root: Rank) -> Self {
        assert!(procs > 0, "a process group has at least one rank");
        assert!(root < procs, "root {} outside a group of {}", root, procs);
        RowDistribution {
            n,
            procs,
            root,
            quotient: n / procs,
            remainder: n % procs,
        }
    }

    /// Rebuilds the root's distribution from the broadcast `[n, quotient, remainder]` header
    pub fn from_header(header: [u64; 3], procs: usize, root: Rank) -> Self {
        RowDistribution {
            n: header[0] as usize,
            procs,
            root,
            quotient: header[1] as usize,
            remainder: header[2] as usize,
        }
    }

    /// sizing header the root broadcasts before the scatter
    pub fn header(&self) -> [u64; 3] {
        [self.n as u64, self.quotient as u64, self.remainder as u64]
    }

    /// side length of the matrix
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn quotient(&self) -> usize {
        self.quotient
    }

    pub fn remainder(&self) -> usize {
        self.remainder
    }

    /// number of rows assigned to `rank`
    pub fn rows(&self, rank: Rank) -> usize {
        if rank == self.root {
            self.quotient + self.remainder
        } else {
            self.quotient
        }
    }

    /// first row owned by `rank`
    pub fn row_offset(&self, rank: Rank) -> usize {
        (0..rank).map(|r| self.rows(r)).sum()
    }

    /// rows per rank, also the length of each rank's result chunk
    pub fn row_counts(&self) -> Vec<usize> {
        (0..self.procs).map(|r| self.rows(r)).collect()
    }

    /// matrix elements per rank
    pub fn block_sizes(&self) -> Vec<usize> {
        (0..self.procs).map(|r| self.block_size(r)).collect()
    }

    pub fn block_size(&self, rank: Rank) -> usize {
        self.rows(rank) * self.n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let dist = RowDistribution::new(4, 2, 0);
        assert_eq!(dist.row_counts(), vec![2, 2]);
        assert_eq!(dist.block_sizes(), vec![8, 8]);
        assert_eq!(dist.row_offset(1), 2);
    }

    #[test]
    fn test_root_takes_remainder() {
        let dist = RowDistribution::new(10, 4, 0);
        assert_eq!(dist.quotient(), 2);
        assert_eq!(dist.remainder(), 2);
        assert_eq!(dist.row_counts(), vec![4, 2, 2, 2]);

        let dist = RowDistribution::new(10, 4, 2);
        assert_eq!(dist.row_counts(), vec![2, 2, 4, 2]);
        assert_eq!(dist.row_offset(3), 8);
    }

    #[test]
    fn test_more_ranks_than_rows() {
        let dist = RowDistribution::new(1, 2, 0);
        assert_eq!(dist.row_counts(), vec![1, 0]);
        assert_eq!(dist.block_sizes(), vec![1, 0]);
    }

    #[test]
    fn test_sizes_cover_matrix() {
        for n in 1..40 {
            for procs in 1..10 {
                for root in 0..procs {
                    let dist = RowDistribution::new(n, procs, root);
                    let sizes = dist.block_sizes();
                    assert_eq!(sizes.iter().sum::<usize>(), n * n);
                    assert!(sizes.iter().all(|&s| s <= sizes[root]));
                    assert_eq!(dist.row_counts().iter().sum::<usize>(), n);
                }
            }
        }
    }

    #[test]
    fn test_header_round_trip() {
        let dist = RowDistribution::new(5000, 3, 0);
        assert_eq!(RowDistribution::from_header(dist.header(), 3, 0), dist);
    }
}
