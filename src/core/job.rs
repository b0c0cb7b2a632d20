use std::time::{Duration, Instant};

use log::{error, info};
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    step::{Step, StepExecution},
};

/// Type alias for job execution results.
type JobResult<T> = Result<T, BatchError>;

/// Represents a job that can be executed.
///
/// A job is a container for a sequence of steps that are executed in order.
/// The job is responsible for orchestrating the steps and reporting the
/// overall result.
pub trait Job {
    /// Runs the job and returns the result of the job execution.
    ///
    /// # Returns
    /// - `Ok(JobExecution)` when every step succeeds
    /// - `Err(BatchError::Step)` naming the first step that failed
    fn run(&self) -> JobResult<JobExecution>;
}

/// Represents the execution of a job.
#[derive(Debug)]
pub struct JobExecution {
    /// The time when the job started executing
    pub start: Instant,
    /// The time when the job finished executing
    pub end: Instant,
    /// The total duration of the job execution
    pub duration: Duration,
    /// Number of items written across all steps
    pub write_count: usize,
}

/// A configured job, created through the `JobBuilder`.
pub struct JobInstance<'a> {
    /// Unique identifier for this job instance
    id: Uuid,
    /// Human-readable name for the job
    name: String,
    /// Collection of steps that make up this job, in execution order
    steps: Vec<&'a dyn Step>,
}

impl JobInstance<'_> {
    pub fn get_name(&self) -> &str {
        &self.name
    }
}

impl Job for JobInstance<'_> {
    fn run(&self) -> JobResult<JobExecution> {
        let start = Instant::now();

        info!("Start of job: {}, id: {}", self.name, self.id);

        let mut write_count = 0;
        for step in &self.steps {
            let mut step_execution = StepExecution::new(step.get_name());

            if let Err(err) = step.execute(&mut step_execution) {
                error!(
                    "Job {} aborted at step {} ({:?}): {}",
                    self.name,
                    step.get_name(),
                    step_execution.status,
                    err
                );
                return Err(BatchError::Step(step.get_name().to_owned()));
            }

            write_count += step_execution.write_count;
        }

        info!("End of job: {}, id: {}", self.name, self.id);

        Ok(JobExecution {
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            write_count,
        })
    }
}

/// Builder for creating a job instance.
///
/// ```rust,no_run,compile_fail
/// use dspace_csv_archive::core::job::JobBuilder;
///
/// let job = JobBuilder::new()
///     .name("csv-to-saf".to_string())
///     .start(&saf_step)
///     .next(&zip_step)
///     .build();
/// ```
#[derive(Default)]
pub struct JobBuilder<'a> {
    /// Optional name for the job (generated randomly if not specified)
    name: Option<String>,
    /// Collection of steps to be executed, in order
    steps: Vec<&'a dyn Step>,
}

impl<'a> JobBuilder<'a> {
    pub fn new() -> Self {
        Self {
            name: None,
            steps: Vec::new(),
        }
    }

    pub fn name(mut self, name: String) -> JobBuilder<'a> {
        self.name = Some(name);
        self
    }

    /// Sets the first step of the job.
    ///
    /// Identical to `next()`, reads better for the initial step.
    pub fn start(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    /// Adds a step to the job. Steps are executed in the order they are added.
    pub fn next(mut self, step: &'a dyn Step) -> JobBuilder<'a> {
        self.steps.push(step);
        self
    }

    pub fn build(self) -> JobInstance<'a> {
        JobInstance {
            id: Uuid::new_v4(),
            name: self.name.unwrap_or_else(build_name),
            steps: self.steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use crate::{
        BatchError,
        core::step::{RepeatStatus, StepBuilder, StepExecution, Tasklet},
    };

    use super::{Job, JobBuilder};

    struct RecordingTasklet<'a> {
        label: &'static str,
        journal: &'a RefCell<Vec<&'static str>>,
        fail: bool,
    }

    impl Tasklet for RecordingTasklet<'_> {
        fn execute(&self, _step_execution: &StepExecution) -> Result<RepeatStatus, BatchError> {
            self.journal.borrow_mut().push(self.label);
            if self.fail {
                Err(BatchError::Configuration(self.label.to_string()))
            } else {
                Ok(RepeatStatus::Finished)
            }
        }
    }

    #[test]
    fn job_should_run_steps_in_order() {
        let journal = RefCell::new(Vec::new());
        let first = RecordingTasklet {
            label: "first",
            journal: &journal,
            fail: false,
        };
        let second = RecordingTasklet {
            label: "second",
            journal: &journal,
            fail: false,
        };
        let step1 = StepBuilder::new("step1").tasklet(&first).build();
        let step2 = StepBuilder::new("step2").tasklet(&second).build();

        let job = JobBuilder::new()
            .name("ordered".to_string())
            .start(&step1)
            .next(&step2)
            .build();

        assert!(job.run().is_ok());
        assert_eq!(*journal.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn job_should_stop_at_first_failing_step() {
        let journal = RefCell::new(Vec::new());
        let failing = RecordingTasklet {
            label: "failing",
            journal: &journal,
            fail: true,
        };
        let never = RecordingTasklet {
            label: "never",
            journal: &journal,
            fail: false,
        };
        let step1 = StepBuilder::new("failing-step").tasklet(&failing).build();
        let step2 = StepBuilder::new("never-step").tasklet(&never).build();

        let job = JobBuilder::new().start(&step1).next(&step2).build();
        let result = job.run();

        assert!(matches!(result, Err(BatchError::Step(name)) if name == "failing-step"));
        assert_eq!(*journal.borrow(), vec!["failing"]);
    }

    #[test]
    fn job_without_name_should_get_a_generated_one() {
        let job = JobBuilder::new().build();

        assert_eq!(job.get_name().len(), 8);
    }
}
