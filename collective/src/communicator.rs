use crate::error::CommError;
use tracing::debug;

/// zero based position of a process within its group
pub type Rank = usize;

/// Types that can travel between ranks
#[cfg(not(feature = "mpi"))]
pub trait Element: Copy + Default + Send + 'static {}

#[cfg(not(feature = "mpi"))]
impl<T> Element for T where T: Copy + Default + Send + 'static {}

/// Types that can travel between ranks
///
/// With the `mpi` feature every element also needs an MPI datatype
#[cfg(feature = "mpi")]
pub trait Element: Copy + Default + Send + 'static + mpi::traits::Equivalence {}

#[cfg(feature = "mpi")]
impl<T> Element for T where T: Copy + Default + Send + 'static + mpi::traits::Equivalence {}

/// A fixed group of ranks exchanging messages
///
/// Only the point to point operations are required. The collectives have
/// linear default implementations built on top of them which a backend with
/// native collectives may override. Every operation blocks, and messages
/// between a fixed pair of ranks arrive in the order they were sent.
pub trait Communicator {
    /// rank of the calling process
    fn rank(&self) -> Rank;
    /// number of ranks in the group
    fn size(&self) -> usize;

    /// Sends `buf` to `dest` as a single message
    fn send<T: Element>(&self, dest: Rank, buf: &[T]) -> Result<(), CommError>;

    /// Receives the next message from `source` into `buf`
    ///
    /// The message must hold exactly `buf.len()` elements
    fn receive_into<T: Element>(&self, source: Rank, buf: &mut [T]) -> Result<(), CommError>;

    /// Checks that `rank` belongs to this group
    fn check_rank(&self, rank: Rank) -> Result<(), CommError> {
        if rank < self.size() {
            Ok(())
        } else {
            Err(CommError::InvalidRank {
                rank,
                size: self.size(),
            })
        }
    }

    /// Copies `buf` on `root` into `buf` on every other rank
    fn broadcast_into<T: Element>(&self, root: Rank, buf: &mut [T]) -> Result<(), CommError> {
        self.check_rank(root)?;
        if self.rank() == root {
            for dest in (0..self.size()).filter(|&r| r != root) {
                self.send(dest, buf)?;
            }
            debug!(rank = root, len = buf.len(), "broadcast sent");
            Ok(())
        } else {
            self.receive_into(root, buf)
        }
    }

    /// Root side of a variable count scatter
    ///
    /// `send` is cut into consecutive pieces of `counts[r]` elements and piece
    /// `r` is delivered to rank `r`. The root's own piece lands in `recv`.
    fn scatter_varcount_into_root<T: Element>(
        &self,
        send: &[T],
        counts: &[usize],
        recv: &mut [T],
    ) -> Result<(), CommError> {
        let rank = self.rank();
        if counts.len() != self.size() {
            return Err(CommError::ScatterCounts(format!(
                "{} counts for a group of {}",
                counts.len(),
                self.size()
            )));
        }
        let total: usize = counts.iter().sum();
        if total != send.len() {
            return Err(CommError::ScatterCounts(format!(
                "counts sum to {} but the send buffer holds {}",
                total,
                send.len()
            )));
        }
        if recv.len() != counts[rank] {
            return Err(CommError::ScatterCounts(format!(
                "root receive buffer holds {} but its count is {}",
                recv.len(),
                counts[rank]
            )));
        }
        let mut offset = 0;
        for (dest, &count) in counts.iter().enumerate() {
            let piece = &send[offset..offset + count];
            if dest == rank {
                recv.copy_from_slice(piece);
            } else {
                self.send(dest, piece)?;
            }
            offset += count;
        }
        debug!(rank, total, "scatter sent");
        Ok(())
    }

    /// Non root side of a variable count scatter
    fn scatter_varcount_into<T: Element>(&self, root: Rank, recv: &mut [T]) -> Result<(), CommError> {
        self.check_rank(root)?;
        self.receive_into(root, recv)
    }
}
