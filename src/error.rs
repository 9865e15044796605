use crate::task::Phase;
use collective::{CommError, GatherError};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum TaskError {
    #[error("expected {expected} input buffers, got {actual}")]
    InputCount { expected: usize, actual: usize },
    #[error("expected {expected} output buffers, got {actual}")]
    OutputCount { expected: usize, actual: usize },
    #[error("matrix holds {matrix} elements, a vector of {vector} needs a square matrix")]
    NotSquare { matrix: usize, vector: usize },
    #[error("matrix and vector must not be empty")]
    Empty,
    #[error("buffer {index} holds {actual} elements but {expected} were declared")]
    BufferTooShort {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("output buffer holds {actual} elements, result has {expected}")]
    OutputTooShort { expected: usize, actual: usize },
    #[error("{actual} called out of order, expected {expected}")]
    OutOfOrder { expected: Phase, actual: Phase },
    #[error("{actual} called after the task finished")]
    Finished { actual: Phase },
    #[error(transparent)]
    Comm(#[from] CommError),
    #[error(transparent)]
    Gather(#[from] GatherError),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
