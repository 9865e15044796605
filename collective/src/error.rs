use crate::communicator::Rank;
use thiserror::Error as ThisError;

/// Failures of the transport itself
#[derive(Debug, ThisError)]
pub enum CommError {
    #[error("rank {peer} hung up before the message arrived")]
    Disconnected { peer: Rank },
    #[error("message from rank {peer} does not hold the requested element type")]
    TypeMismatch { peer: Rank },
    #[error("message from rank {peer} has {actual} elements, expected {expected}")]
    LengthMismatch {
        peer: Rank,
        expected: usize,
        actual: usize,
    },
    #[error("rank {rank} is outside a group of size {size}")]
    InvalidRank { rank: Rank, size: usize },
    #[error("scatter counts do not match: {0}")]
    ScatterCounts(String),
    #[error("rank {rank} panicked")]
    RankPanicked { rank: Rank },
    #[error("local world panicked")]
    WorldPanicked,
}

/// Protocol violations detected by the tree gather
#[derive(Debug, ThisError)]
pub enum GatherError {
    #[error(transparent)]
    Comm(#[from] CommError),
    #[error("sizes table has {actual} entries for a group of {expected}")]
    SizesLength { expected: usize, actual: usize },
    #[error("rank {rank} holds {actual} elements but sizes[{rank}] = {expected}")]
    InputLength {
        rank: Rank,
        expected: usize,
        actual: usize,
    },
    #[error("child {child} forwarded {actual} elements, its subtree accounts for {expected}")]
    PayloadLength {
        child: Rank,
        expected: usize,
        actual: usize,
    },
    #[error("root output holds {actual} elements, gathered {expected}")]
    OutputLength { expected: usize, actual: usize },
    #[error("rank {rank} is the gather root and must call tree_gather_into_root")]
    RootRole { rank: Rank },
}
