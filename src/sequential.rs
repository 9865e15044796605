use crate::error::TaskError;
use crate::kernel;
use crate::task::{Phase, PhaseTracker, Task, TaskData};

/// Single process matrix-vector product, the reference for the distributed kernel
#[derive(Debug)]
pub struct MatVecSequential<'a> {
    task_data: TaskData<'a>,
    phases: PhaseTracker,
    matrix: Vec<i32>,
    vector: Vec<i32>,
    result: Vec<i32>,
}

impl<'a> MatVecSequential<'a> {
    pub fn new(task_data: TaskData<'a>) -> Self {
        MatVecSequential {
            task_data,
            phases: PhaseTracker::default(),
            matrix: Vec::new(),
            vector: Vec::new(),
            result: Vec::new(),
        }
    }

    /// result of the last run, empty before `run`
    pub fn result(&self) -> &[i32] {
        &self.result
    }

    fn load(&mut self) -> Result<(), TaskError> {
        let (matrix, vector) = self.task_data.load_inputs()?;
        self.result = vec![0; vector.len()];
        self.matrix = matrix;
        self.vector = vector;
        Ok(())
    }
}

impl<'a> Task for MatVecSequential<'a> {
    fn validation(&mut self) -> bool {
        let result = self
            .phases
            .check(Phase::Validation)
            .and_then(|_| self.task_data.check_shape().map(|_| ()));
        self.phases.complete(Phase::Validation, result)
    }

    fn pre_processing(&mut self) -> bool {
        let result = self
            .phases
            .check(Phase::PreProcessing)
            .and_then(|_| self.load());
        self.phases.complete(Phase::PreProcessing, result)
    }

    fn run(&mut self) -> bool {
        let result = self.phases.check(Phase::Run).and_then(|_| {
            kernel::mat_vec(&self.matrix, &self.vector, &mut self.result)
        });
        self.phases.complete(Phase::Run, result)
    }

    fn post_processing(&mut self) -> bool {
        let result = self
            .phases
            .check(Phase::PostProcessing)
            .and_then(|_| self.task_data.store_output(&self.result));
        self.phases.complete(Phase::PostProcessing, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::execute;

    fn multiply(matrix: &[i32], vector: &[i32]) -> Option<Vec<i32>> {
        let mut out = vec![0; vector.len()];
        let ok = {
            let data = TaskData::new()
                .with_input(matrix)
                .with_input(vector)
                .with_output(&mut out);
            execute(&mut MatVecSequential::new(data))
        };
        if ok {
            Some(out)
        } else {
            None
        }
    }

    #[test]
    fn test_identity() {
        let mut identity = vec![0; 16];
        for i in 0..4 {
            identity[i * 4 + i] = 1;
        }
        assert_eq!(multiply(&identity, &[1, 2, 3, 4]), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_single_element() {
        assert_eq!(multiply(&[6], &[7]), Some(vec![42]));
    }

    #[test]
    fn test_row_sums() {
        let matrix = [1, 2, 3, 4, 5, 6, 7, 8, 9];
        assert_eq!(multiply(&matrix, &[1, 1, 1]), Some(vec![6, 15, 24]));
    }

    #[test]
    fn test_wraps_on_overflow() {
        let matrix = [i32::MAX, i32::MAX, 0, 0];
        assert_eq!(
            multiply(&matrix, &[1, 2]),
            Some(vec![i32::MAX.wrapping_mul(3), 0])
        );
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(multiply(&[], &[]), None);
    }

    #[test]
    fn test_rejects_non_square() {
        assert_eq!(multiply(&[1, 2, 3], &[1, 2]), None);
    }

    #[test]
    fn test_rejects_missing_output() {
        let data = TaskData::new().with_input(&[1]).with_input(&[1]);
        let mut task = MatVecSequential::new(data);
        assert!(!task.validation());
        assert!(!task.pre_processing());
    }

    #[test]
    fn test_phases_in_order() {
        let mut out = [0; 1];
        let data = TaskData::new()
            .with_input(&[3])
            .with_input(&[4])
            .with_output(&mut out);
        let mut task = MatVecSequential::new(data);
        assert!(!task.run());
        assert!(task.validation());
        assert!(task.pre_processing());
        assert!(task.run());
        assert_eq!(task.result(), &[12]);
        assert!(!task.run());
        assert!(task.post_processing());
        drop(task);
        assert_eq!(out, [12]);
    }
}
