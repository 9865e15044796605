use crate::distribution::RowDistribution;
use crate::error::TaskError;
use crate::kernel;
use crate::task::{Phase, PhaseTracker, Task, TaskData};
use crate::ROOT;
use collective::{tree_gather_into, tree_gather_into_root, Communicator, Rank};
use std::time::Instant;
use tracing::{debug, info};

/// What one rank does in each phase
///
/// The root owns the caller's buffers, workers only ever hold what the root
/// sends them.
trait RankRole<C: Communicator> {
    fn validate(&self) -> Result<(), TaskError>;
    fn load(&mut self) -> Result<(), TaskError>;
    fn compute(&mut self, comm: &C, root: Rank) -> Result<(), TaskError>;
    fn store(&mut self) -> Result<(), TaskError>;
    fn result(&self) -> Option<&[i32]>;
}

struct RootRole<'a> {
    task_data: TaskData<'a>,
    matrix: Vec<i32>,
    vector: Vec<i32>,
    result: Vec<i32>,
}

impl<'a, C: Communicator> RankRole<C> for RootRole<'a> {
    fn validate(&self) -> Result<(), TaskError> {
        self.task_data.check_shape().map(|_| ())
    }

    fn load(&mut self) -> Result<(), TaskError> {
        let (matrix, vector) = self.task_data.load_inputs()?;
        self.result = vec![0; vector.len()];
        self.matrix = matrix;
        self.vector = vector;
        Ok(())
    }

    fn compute(&mut self, comm: &C, root: Rank) -> Result<(), TaskError> {
        let start_time = Instant::now();
        let dist = RowDistribution::new(self.vector.len(), comm.size(), root);
        info!(
            n = dist.n(),
            procs = comm.size(),
            quotient = dist.quotient(),
            remainder = dist.remainder(),
            "distributing rows"
        );

        let mut header = dist.header();
        comm.broadcast_into(root, &mut header[..])?;
        comm.broadcast_into(root, &mut self.vector[..])?;

        let mut block = vec![0; dist.block_size(root)];
        comm.scatter_varcount_into_root(&self.matrix, &dist.block_sizes(), &mut block)?;

        let mut partial = vec![0; dist.rows(root)];
        kernel::par_mat_vec(&block, &self.vector, &mut partial)?;

        tree_gather_into_root(comm, &partial, &mut self.result, &dist.row_counts())?;
        info!(
            took_ms = start_time.elapsed().as_millis() as u64,
            "gathered result"
        );
        Ok(())
    }

    fn store(&mut self) -> Result<(), TaskError> {
        self.task_data.store_output(&self.result)
    }

    fn result(&self) -> Option<&[i32]> {
        Some(&self.result)
    }
}

#[derive(Default)]
struct WorkerRole {
    rank: Rank,
    vector: Vec<i32>,
    block: Vec<i32>,
    partial: Vec<i32>,
}

impl<C: Communicator> RankRole<C> for WorkerRole {
    // workers see no input until the root has validated its own
    fn validate(&self) -> Result<(), TaskError> {
        Ok(())
    }

    fn load(&mut self) -> Result<(), TaskError> {
        Ok(())
    }

    fn compute(&mut self, comm: &C, root: Rank) -> Result<(), TaskError> {
        let rank = self.rank;
        let mut header = [0u64; 3];
        comm.broadcast_into(root, &mut header[..])?;
        let dist = RowDistribution::from_header(header, comm.size(), root);

        self.vector = vec![0; dist.n()];
        comm.broadcast_into(root, &mut self.vector[..])?;

        self.block = vec![0; dist.block_size(rank)];
        comm.scatter_varcount_into(root, &mut self.block[..])?;
        debug!(rank, rows = dist.rows(rank), "received row block");

        self.partial = vec![0; dist.rows(rank)];
        kernel::par_mat_vec(&self.block, &self.vector, &mut self.partial)?;

        tree_gather_into(comm, root, &self.partial, &dist.row_counts())?;
        Ok(())
    }

    fn store(&mut self) -> Result<(), TaskError> {
        Ok(())
    }

    fn result(&self) -> Option<&[i32]> {
        None
    }
}

/// Matrix-vector product spread over a process group
///
/// Every rank builds one of these around the same communicator and calls the
/// four phases in lockstep. Only the root's `TaskData` is read; the root
/// broadcasts the problem shape and the vector, scatters row blocks, and
/// collects the partial products with the tree gather.
pub struct MatVecParallel<'a, C: Communicator> {
    comm: &'a C,
    root: Rank,
    phases: PhaseTracker,
    role: Box<dyn RankRole<C> + 'a>,
}

impl<'a, C: Communicator> MatVecParallel<'a, C> {
    pub fn new(comm: &'a C, task_data: TaskData<'a>) -> Self {
        Self::with_root(comm, task_data, ROOT)
    }

    /// Uses `root` instead of rank 0 as the owner of input and output
    pub fn with_root(comm: &'a C, task_data: TaskData<'a>, root: Rank) -> Self {
        let role: Box<dyn RankRole<C> + 'a> = if comm.rank() == root {
            Box::new(RootRole {
                task_data,
                matrix: Vec::new(),
                vector: Vec::new(),
                result: Vec::new(),
            })
        } else {
            Box::new(WorkerRole {
                rank: comm.rank(),
                ..WorkerRole::default()
            })
        };
        MatVecParallel {
            comm,
            root,
            phases: PhaseTracker::default(),
            role,
        }
    }

    pub fn is_root(&self) -> bool {
        self.comm.rank() == self.root
    }

    /// gathered result on the root after `run`, `None` on workers
    pub fn result(&self) -> Option<&[i32]> {
        self.role.result()
    }
}

impl<'a, C: Communicator> Task for MatVecParallel<'a, C> {
    fn validation(&mut self) -> bool {
        let result = self
            .phases
            .check(Phase::Validation)
            .and_then(|_| self.comm.check_rank(self.root).map_err(TaskError::from))
            .and_then(|_| self.role.validate());
        self.phases.complete(Phase::Validation, result)
    }

    fn pre_processing(&mut self) -> bool {
        let result = self
            .phases
            .check(Phase::PreProcessing)
            .and_then(|_| self.role.load());
        self.phases.complete(Phase::PreProcessing, result)
    }

    fn run(&mut self) -> bool {
        let (comm, root) = (self.comm, self.root);
        let result = self
            .phases
            .check(Phase::Run)
            .and_then(|_| self.role.compute(comm, root));
        self.phases.complete(Phase::Run, result)
    }

    fn post_processing(&mut self) -> bool {
        let result = self
            .phases
            .check(Phase::PostProcessing)
            .and_then(|_| self.role.store());
        self.phases.complete(Phase::PostProcessing, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::execute;
    use collective::LocalWorld;

    #[test]
    fn test_single_rank() {
        let matrix = [1, 2, 3, 4];
        let vector = [5, 6];
        let results = LocalWorld::run(1, |comm| {
            let mut out = vec![0; 2];
            let ok = {
                let data = TaskData::new()
                    .with_input(&matrix)
                    .with_input(&vector)
                    .with_output(&mut out);
                execute(&mut MatVecParallel::new(&comm, data))
            };
            (ok, out)
        })
        .unwrap();
        assert_eq!(results, vec![(true, vec![17, 39])]);
    }

    #[test]
    fn test_roles() {
        let results = LocalWorld::run(3, |comm| {
            let task = MatVecParallel::new(&comm, TaskData::new());
            (task.is_root(), task.result().is_some())
        })
        .unwrap();
        assert_eq!(results, vec![(true, true), (false, false), (false, false)]);
    }

    #[test]
    fn test_workers_pass_validation_on_empty_data() {
        let results = LocalWorld::run(3, |comm| {
            MatVecParallel::new(&comm, TaskData::new()).validation()
        })
        .unwrap();
        assert_eq!(results, vec![false, true, true]);
    }

    #[test]
    fn test_root_outside_group() {
        let results = LocalWorld::run(2, |comm| {
            MatVecParallel::with_root(&comm, TaskData::new(), 5).validation()
        })
        .unwrap();
        assert_eq!(results, vec![false, false]);
    }

    #[test]
    fn test_nonzero_root() {
        let n = 7;
        let matrix: Vec<i32> = (0..(n * n) as i32).collect();
        let vector: Vec<i32> = (1..=n as i32).collect();
        let mut expected = vec![0; n];
        kernel::mat_vec(&matrix, &vector, &mut expected).unwrap();

        let results = LocalWorld::run(4, |comm| {
            let mut out = vec![0; n];
            let ok = {
                let data = if comm.rank() == 2 {
                    TaskData::new()
                        .with_input(&matrix)
                        .with_input(&vector)
                        .with_output(&mut out)
                } else {
                    TaskData::new()
                };
                execute(&mut MatVecParallel::with_root(&comm, data, 2))
            };
            (ok, out)
        })
        .unwrap();
        assert!(results.iter().all(|(ok, _)| *ok));
        assert_eq!(results[2].1, expected);
        assert_eq!(results[0].1, vec![0; n]);
    }
}
