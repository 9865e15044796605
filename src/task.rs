use crate::error::TaskError;
use std::fmt;
use tracing::{debug, error, warn};

/// Raw buffers handed to a task by its caller
///
/// `inputs[0]` is the flattened matrix, `inputs[1]` the vector and
/// `outputs[0]` receives the result. The counts say how many elements of each
/// buffer belong to the problem. Ranks other than the root pass an empty one.
#[derive(Debug, Default)]
pub struct TaskData<'a> {
    pub inputs: Vec<&'a [i32]>,
    pub inputs_count: Vec<usize>,
    pub outputs: Vec<&'a mut [i32]>,
    pub outputs_count: Vec<usize>,
}

impl<'a> TaskData<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// appends an input buffer and its element count
    pub fn with_input(mut self, buf: &'a [i32]) -> Self {
        self.inputs_count.push(buf.len());
        self.inputs.push(buf);
        self
    }

    /// appends an output buffer and its element count
    pub fn with_output(mut self, buf: &'a mut [i32]) -> Self {
        self.outputs_count.push(buf.len());
        self.outputs.push(buf);
        self
    }

    /// Checks for a matrix and vector input, one output and a square, non empty shape
    ///
    /// Returns the side length of the matrix
    pub fn check_shape(&self) -> Result<usize, TaskError> {
        if self.inputs.len() != 2 || self.inputs_count.len() != 2 {
            return Err(TaskError::InputCount {
                expected: 2,
                actual: self.inputs.len(),
            });
        }
        if self.outputs.len() != 1 || self.outputs_count.len() != 1 {
            return Err(TaskError::OutputCount {
                expected: 1,
                actual: self.outputs.len(),
            });
        }
        let (matrix, vector) = (self.inputs_count[0], self.inputs_count[1]);
        if vector.checked_mul(vector) != Some(matrix) {
            return Err(TaskError::NotSquare { matrix, vector });
        }
        if vector == 0 {
            return Err(TaskError::Empty);
        }
        Ok(vector)
    }

    /// Copies the declared part of every input into owned storage
    pub fn load_inputs(&self) -> Result<(Vec<i32>, Vec<i32>), TaskError> {
        let mut owned = Vec::with_capacity(2);
        for index in 0..2 {
            let buf = self.inputs.get(index).copied().unwrap_or_default();
            let count = self.inputs_count.get(index).copied().unwrap_or_default();
            if buf.len() < count {
                return Err(TaskError::BufferTooShort {
                    index,
                    expected: count,
                    actual: buf.len(),
                });
            }
            owned.push(buf[..count].to_vec());
        }
        let vector = owned.pop().unwrap_or_default();
        let matrix = owned.pop().unwrap_or_default();
        Ok((matrix, vector))
    }

    /// Writes `result` into the first output buffer
    pub fn store_output(&mut self, result: &[i32]) -> Result<(), TaskError> {
        let output = match self.outputs.first_mut() {
            Some(output) => output,
            None => {
                return Err(TaskError::OutputCount {
                    expected: 1,
                    actual: 0,
                })
            }
        };
        if output.len() < result.len() {
            return Err(TaskError::OutputTooShort {
                expected: result.len(),
                actual: output.len(),
            });
        }
        output[..result.len()].copy_from_slice(result);
        Ok(())
    }
}

/// The four phases of a task, in the order they must run
#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord)]
pub enum Phase {
    Validation,
    PreProcessing,
    Run,
    PostProcessing,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase_str = match self {
            Phase::Validation => "validation",
            Phase::PreProcessing => "pre_processing",
            Phase::Run => "run",
            Phase::PostProcessing => "post_processing",
        };
        write!(f, "{}", phase_str)
    }
}

impl Phase {
    fn next(self) -> Option<Phase> {
        match self {
            Phase::Validation => Some(Phase::PreProcessing),
            Phase::PreProcessing => Some(Phase::Run),
            Phase::Run => Some(Phase::PostProcessing),
            Phase::PostProcessing => None,
        }
    }
}

/// Remembers which phase may run next
///
/// A phase that fails does not advance the tracker, so every later phase is
/// refused until a new task is built.
#[derive(Debug)]
pub struct PhaseTracker {
    next: Option<Phase>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        PhaseTracker {
            next: Some(Phase::Validation),
        }
    }
}

impl PhaseTracker {
    /// Fails unless `phase` is the phase due
    pub fn check(&self, phase: Phase) -> Result<(), TaskError> {
        match self.next {
            Some(expected) if expected == phase => Ok(()),
            Some(expected) => Err(TaskError::OutOfOrder {
                expected,
                actual: phase,
            }),
            None => Err(TaskError::Finished { actual: phase }),
        }
    }

    /// Records the outcome of `phase`, logging the cause of a failure
    pub fn complete(&mut self, phase: Phase, result: Result<(), TaskError>) -> bool {
        match result {
            Ok(()) => {
                debug!(%phase, "phase complete");
                self.next = phase.next();
                true
            }
            Err(err @ TaskError::NotSquare { .. })
            | Err(err @ TaskError::Empty)
            | Err(err @ TaskError::InputCount { .. })
            | Err(err @ TaskError::OutputCount { .. }) => {
                warn!(%phase, "{}", err);
                false
            }
            Err(err) => {
                error!(%phase, "{}", err);
                false
            }
        }
    }
}

/// Four phase interface shared by the sequential and distributed kernels
///
/// Callers run the phases in order, once each, and stop at the first `false`.
pub trait Task {
    fn validation(&mut self) -> bool;
    fn pre_processing(&mut self) -> bool;
    fn run(&mut self) -> bool;
    fn post_processing(&mut self) -> bool;
}

/// Runs every phase of `task` in order, stopping at the first failure
pub fn execute<T: Task + ?Sized>(task: &mut T) -> bool {
    task.validation() && task.pre_processing() && task.run() && task.post_processing()
}
