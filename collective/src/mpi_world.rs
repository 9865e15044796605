use crate::communicator::{Communicator, Element, Rank};
use crate::error::CommError;
use mpi::datatype::Partition;
use mpi::traits::{Communicator as MpiCommunicator, Destination, Equivalence, Root, Source};
use mpi::Count;
use tracing::debug;

/// A process group backed by an MPI communicator
///
/// Point to point traffic maps onto `MPI_Send`/`MPI_Recv`, the collectives
/// use the native broadcast and scatterv instead of the linear defaults.
pub struct MpiWorld<W> {
    world: W,
}

impl<W: MpiCommunicator> MpiWorld<W> {
    pub fn new(world: W) -> Self {
        MpiWorld { world }
    }
}

fn to_mpi_rank(rank: Rank) -> mpi::topology::Rank {
    rank as mpi::topology::Rank
}

impl<W: MpiCommunicator> Communicator for MpiWorld<W> {
    fn rank(&self) -> Rank {
        self.world.rank() as Rank
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn send<T: Element>(&self, dest: Rank, buf: &[T]) -> Result<(), CommError> {
        self.check_rank(dest)?;
        self.world.process_at_rank(to_mpi_rank(dest)).send(buf);
        Ok(())
    }

    fn receive_into<T: Element>(&self, source: Rank, buf: &mut [T]) -> Result<(), CommError> {
        self.check_rank(source)?;
        let status = self
            .world
            .process_at_rank(to_mpi_rank(source))
            .receive_into(buf);
        let actual = status.count(T::equivalent_datatype()) as usize;
        if actual != buf.len() {
            return Err(CommError::LengthMismatch {
                peer: source,
                expected: buf.len(),
                actual,
            });
        }
        Ok(())
    }

    fn broadcast_into<T: Element>(&self, root: Rank, buf: &mut [T]) -> Result<(), CommError> {
        self.check_rank(root)?;
        self.world
            .process_at_rank(to_mpi_rank(root))
            .broadcast_into(buf);
        Ok(())
    }

    fn scatter_varcount_into_root<T: Element>(
        &self,
        send: &[T],
        counts: &[usize],
        recv: &mut [T],
    ) -> Result<(), CommError> {
        if counts.len() != self.size() || counts.iter().sum::<usize>() != send.len() {
            return Err(CommError::ScatterCounts(format!(
                "{} counts summing to {} for a send buffer of {}",
                counts.len(),
                counts.iter().sum::<usize>(),
                send.len()
            )));
        }
        let counts: Vec<Count> = counts.iter().map(|&c| c as Count).collect();
        let displs: Vec<Count> = counts
            .iter()
            .scan(0, |offset, &c| {
                let displ = *offset;
                *offset += c;
                Some(displ)
            })
            .collect();
        let partition = Partition::new(send, &counts[..], &displs[..]);
        self.world
            .process_at_rank(self.world.rank())
            .scatter_varcount_into_root(&partition, recv);
        debug!(rank = self.rank(), total = send.len(), "scatterv sent");
        Ok(())
    }

    fn scatter_varcount_into<T: Element>(&self, root: Rank, recv: &mut [T]) -> Result<(), CommError> {
        self.check_rank(root)?;
        self.world
            .process_at_rank(to_mpi_rank(root))
            .scatter_varcount_into(recv);
        Ok(())
    }
}
