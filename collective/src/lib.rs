/// Message passing primitives for a fixed group of ranks
///
/// `Communicator` is the seam between the algorithms in this crate and the
/// transport. `LocalWorld` runs every rank as a thread of the current process,
/// `MpiWorld` (behind the `mpi` feature) runs on top of an MPI universe.
pub mod communicator;
pub mod error;
pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi_world;
pub mod topology;
pub mod tree_gather;

pub use communicator::{Communicator, Element, Rank};
pub use error::{CommError, GatherError};
pub use local::{LocalComm, LocalWorld};
#[cfg(feature = "mpi")]
pub use mpi_world::MpiWorld;
#[cfg(feature = "mpi")]
pub use ::mpi;
pub use topology::{tree_links, RelationTree, TreeLinks};
pub use tree_gather::{tree_gather_into, tree_gather_into_root, tree_gather_varcount};
