use std::time::{Duration, Instant};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::BatchError;

use super::item::{ItemProcessor, ItemReader, ItemWriter};

/// Status of a chunk after a read phase.
#[derive(Debug, PartialEq)]
pub enum ChunkStatus {
    /// The reader is exhausted; the chunk may still hold the last items.
    Finished,
    /// The chunk reached `chunk_size` items and more may follow.
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepStatus {
    Starting,
    Started,
    Success,
    ReadError,
    ProcessorError,
    WriteError,
    Failed,
}

/// Outcome of a tasklet invocation.
#[derive(Debug, PartialEq)]
pub enum RepeatStatus {
    /// The tasklet wants to be invoked again.
    Continuable,
    /// The tasklet has finished its work.
    Finished,
}

/// Execution record of a step: identity, status, timings and counters.
pub struct StepExecution {
    /// Unique identifier for this step execution
    pub id: Uuid,
    /// Human-readable name for the step
    pub name: String,
    /// Current status of the step execution
    pub status: StepStatus,
    pub start_time: Instant,
    pub end_time: Instant,
    pub duration: Duration,
    /// Number of items successfully read
    pub read_count: usize,
    /// Number of items successfully written
    pub write_count: usize,
    /// Number of errors encountered during reading
    pub read_error_count: usize,
    /// Number of errors encountered during processing
    pub process_error_count: usize,
    /// Number of errors encountered during writing
    pub write_error_count: usize,
}

impl StepExecution {
    pub fn new(name: &str) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: StepStatus::Starting,
            start_time: now,
            end_time: now,
            duration: Duration::default(),
            read_count: 0,
            write_count: 0,
            read_error_count: 0,
            process_error_count: 0,
            write_error_count: 0,
        }
    }
}

pub trait Step {
    /// Executes the step.
    ///
    /// # Returns
    /// - `Ok(())`: The step completed successfully
    /// - `Err(BatchError::Step)`: The step failed, details are in `step_execution`
    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError>;

    fn get_name(&self) -> &str;
}

/// A single unit of work that does not follow the read/process/write pattern.
pub trait Tasklet {
    fn execute(&self, step_execution: &StepExecution) -> Result<RepeatStatus, BatchError>;
}

pub struct TaskletStep<'a> {
    name: String,
    tasklet: &'a dyn Tasklet,
}

impl Step for TaskletStep<'_> {
    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        let start_time = Instant::now();
        step_execution.status = StepStatus::Started;

        info!(
            "Start of step: {}, id: {}",
            step_execution.name, step_execution.id
        );

        let result = loop {
            match self.tasklet.execute(step_execution) {
                Ok(RepeatStatus::Continuable) => continue,
                Ok(RepeatStatus::Finished) => break Ok(()),
                Err(error) => break Err(error),
            }
        };

        step_execution.start_time = start_time;
        step_execution.end_time = Instant::now();
        step_execution.duration = start_time.elapsed();

        match result {
            Ok(()) => {
                step_execution.status = StepStatus::Success;
                info!(
                    "End of step: {}, id: {}",
                    step_execution.name, step_execution.id
                );
                Ok(())
            }
            Err(error) => {
                warn!("Tasklet of step {} failed: {}", step_execution.name, error);
                step_execution.status = StepStatus::Failed;
                Err(BatchError::Step(step_execution.name.clone()))
            }
        }
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}

pub struct TaskletStepBuilder<'a> {
    name: String,
    tasklet: &'a dyn Tasklet,
}

impl<'a> TaskletStepBuilder<'a> {
    pub fn build(self) -> TaskletStep<'a> {
        TaskletStep {
            name: self.name,
            tasklet: self.tasklet,
        }
    }
}

pub struct ChunkOrientedStep<'a, I, O> {
    name: String,
    /// Component responsible for reading items from the source
    reader: &'a dyn ItemReader<I>,
    /// Component responsible for processing items
    processor: &'a dyn ItemProcessor<I, O>,
    /// Component responsible for writing items to the destination
    writer: &'a dyn ItemWriter<O>,
    /// Number of items to process in each chunk
    chunk_size: u16,
    /// Maximum number of errors allowed before failing the step
    skip_limit: u16,
}

impl<I, O> Step for ChunkOrientedStep<'_, I, O> {
    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        let start_time = Instant::now();
        step_execution.status = StepStatus::Started;

        info!(
            "Start of step: {}, id: {}",
            step_execution.name, step_execution.id
        );

        match self.writer.open() {
            Ok(()) => step_execution.status = self.run_chunks(step_execution),
            Err(error) => {
                warn!("Unable to open writer: {}", error);
                step_execution.status = StepStatus::WriteError;
            }
        }

        Self::manage_error(self.writer.close());

        info!(
            "End of step: {}, id: {}",
            step_execution.name, step_execution.id
        );

        step_execution.start_time = start_time;
        step_execution.end_time = Instant::now();
        step_execution.duration = start_time.elapsed();

        if step_execution.status == StepStatus::Success {
            Ok(())
        } else {
            Err(BatchError::Step(step_execution.name.clone()))
        }
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}

impl<I, O> ChunkOrientedStep<'_, I, O> {
    fn run_chunks(&self, step_execution: &mut StepExecution) -> StepStatus {
        loop {
            let (read_items, chunk_status) = match self.read_chunk(step_execution) {
                Ok(chunk) => chunk,
                Err(_) => return StepStatus::ReadError,
            };

            let processed_items = match self.process_chunk(step_execution, &read_items) {
                Ok(items) => items,
                Err(_) => return StepStatus::ProcessorError,
            };

            if self.write_chunk(step_execution, &processed_items).is_err() {
                return StepStatus::WriteError;
            }

            if chunk_status == ChunkStatus::Finished {
                return StepStatus::Success;
            }
        }
    }

    /// Reads up to `chunk_size` items from the reader.
    ///
    /// # Returns
    /// - `Ok((items, ChunkStatus::Full))`: the chunk is full, more items may follow
    /// - `Ok((items, ChunkStatus::Finished))`: the reader is exhausted
    /// - `Err(BatchError)`: a read failed and the skip limit was reached
    fn read_chunk(
        &self,
        step_execution: &mut StepExecution,
    ) -> Result<(Vec<I>, ChunkStatus), BatchError> {
        debug!("Start reading chunk");

        let mut read_items = Vec::with_capacity(self.chunk_size as usize);

        loop {
            match self.reader.read() {
                Ok(Some(item)) => {
                    read_items.push(item);
                    step_execution.read_count += 1;

                    if read_items.len() >= self.chunk_size as usize {
                        return Ok((read_items, ChunkStatus::Full));
                    }
                }
                Ok(None) => return Ok((read_items, ChunkStatus::Finished)),
                Err(error) => {
                    warn!("Error reading item: {}", error);
                    step_execution.read_error_count += 1;

                    if self.is_skip_limit_reached(step_execution) {
                        return Err(error);
                    }
                }
            }
        }
    }

    fn process_chunk(
        &self,
        step_execution: &mut StepExecution,
        read_items: &[I],
    ) -> Result<Vec<O>, BatchError> {
        debug!("Processing chunk of {} items", read_items.len());
        let mut result = Vec::with_capacity(read_items.len());

        for item in read_items {
            match self.processor.process(item) {
                Ok(processed_item) => result.push(processed_item),
                Err(error) => {
                    warn!("Error processing item: {}", error);
                    step_execution.process_error_count += 1;

                    if self.is_skip_limit_reached(step_execution) {
                        return Err(error);
                    }
                }
            }
        }

        Ok(result)
    }

    fn write_chunk(
        &self,
        step_execution: &mut StepExecution,
        processed_items: &[O],
    ) -> Result<(), BatchError> {
        if processed_items.is_empty() {
            debug!("No items to write, skipping write call");
            return Ok(());
        }

        debug!("Writing chunk of {} items", processed_items.len());

        match self.writer.write(processed_items) {
            Ok(()) => {
                step_execution.write_count += processed_items.len();
                Self::manage_error(self.writer.flush());
                Ok(())
            }
            Err(error) => {
                warn!("Error writing items: {}", error);
                let failed = match &error {
                    BatchError::PartialWrite { failed, .. } => {
                        (*failed).min(processed_items.len())
                    }
                    _ => processed_items.len(),
                };
                step_execution.write_count += processed_items.len() - failed;
                step_execution.write_error_count += failed;

                if failed < processed_items.len() {
                    Self::manage_error(self.writer.flush());
                }

                if self.is_skip_limit_reached(step_execution) {
                    return Err(error);
                }
                Ok(())
            }
        }
    }

    fn is_skip_limit_reached(&self, step_execution: &StepExecution) -> bool {
        step_execution.read_error_count
            + step_execution.write_error_count
            + step_execution.process_error_count
            > self.skip_limit.into()
    }

    /// Logs errors from operations that must not fail the step.
    fn manage_error(result: Result<(), BatchError>) {
        if let Err(error) = result {
            warn!("Non-fatal error: {}", error);
        }
    }
}

pub struct ChunkOrientedStepBuilder<'a, I, O> {
    name: String,
    reader: Option<&'a dyn ItemReader<I>>,
    processor: Option<&'a dyn ItemProcessor<I, O>>,
    writer: Option<&'a dyn ItemWriter<O>>,
    chunk_size: u16,
    skip_limit: u16,
}

impl<'a, I, O> ChunkOrientedStepBuilder<'a, I, O> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reader: None,
            processor: None,
            writer: None,
            chunk_size: 10,
            skip_limit: 0,
        }
    }

    pub fn reader(mut self, reader: &'a dyn ItemReader<I>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a dyn ItemProcessor<I, O>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a dyn ItemWriter<O>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn chunk_size(mut self, chunk_size: u16) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn skip_limit(mut self, skip_limit: u16) -> Self {
        self.skip_limit = skip_limit;
        self
    }

    /// Builds the step.
    ///
    /// Fails with `BatchError::Configuration` when the reader, processor or
    /// writer is missing.
    pub fn build(self) -> Result<ChunkOrientedStep<'a, I, O>, BatchError> {
        let missing = |component: &str| {
            BatchError::Configuration(format!(
                "{} is required for building step {}",
                component, self.name
            ))
        };

        Ok(ChunkOrientedStep {
            reader: self.reader.ok_or_else(|| missing("Reader"))?,
            processor: self.processor.ok_or_else(|| missing("Processor"))?,
            writer: self.writer.ok_or_else(|| missing("Writer"))?,
            chunk_size: self.chunk_size,
            skip_limit: self.skip_limit,
            name: self.name,
        })
    }
}

pub struct StepBuilder {
    name: String,
}

impl StepBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn tasklet(self, tasklet: &dyn Tasklet) -> TaskletStepBuilder<'_> {
        TaskletStepBuilder {
            name: self.name,
            tasklet,
        }
    }

    pub fn chunk<'a, I, O>(self, chunk_size: u16) -> ChunkOrientedStepBuilder<'a, I, O> {
        ChunkOrientedStepBuilder::new(&self.name).chunk_size(chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::core::item::{ItemProcessorResult, ItemReaderResult, ItemWriterResult};

    struct CountingTasklet {
        calls: Cell<usize>,
        until: usize,
    }

    impl Tasklet for CountingTasklet {
        fn execute(&self, _step_execution: &StepExecution) -> Result<RepeatStatus, BatchError> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() < self.until {
                Ok(RepeatStatus::Continuable)
            } else {
                Ok(RepeatStatus::Finished)
            }
        }
    }

    struct FailingTasklet;

    impl Tasklet for FailingTasklet {
        fn execute(&self, _step_execution: &StepExecution) -> Result<RepeatStatus, BatchError> {
            Err(BatchError::Configuration("boom".to_string()))
        }
    }

    /// Yields the given values; `None` entries are read errors.
    struct VecReader {
        values: RefCell<Vec<Option<u32>>>,
    }

    impl VecReader {
        fn new(mut values: Vec<Option<u32>>) -> Self {
            values.reverse();
            Self {
                values: RefCell::new(values),
            }
        }
    }

    impl ItemReader<u32> for VecReader {
        fn read(&self) -> ItemReaderResult<u32> {
            match self.values.borrow_mut().pop() {
                Some(Some(value)) => Ok(Some(value)),
                Some(None) => Err(BatchError::ItemReader("unreadable row".to_string())),
                None => Ok(None),
            }
        }
    }

    struct DoubleProcessor;

    impl ItemProcessor<u32, u32> for DoubleProcessor {
        fn process(&self, item: &u32) -> ItemProcessorResult<u32> {
            Ok(item * 2)
        }
    }

    struct PassThrough;

    impl ItemProcessor<u32, u32> for PassThrough {
        fn process(&self, item: &u32) -> ItemProcessorResult<u32> {
            Ok(*item)
        }
    }

    #[derive(Default)]
    struct CollectingWriter {
        chunks: RefCell<Vec<Vec<u32>>>,
        opened: Cell<bool>,
        closed: Cell<bool>,
    }

    impl ItemWriter<u32> for CollectingWriter {
        fn write(&self, items: &[u32]) -> ItemWriterResult {
            self.chunks.borrow_mut().push(items.to_vec());
            Ok(())
        }

        fn open(&self) -> ItemWriterResult {
            self.opened.set(true);
            Ok(())
        }

        fn close(&self) -> ItemWriterResult {
            self.closed.set(true);
            Ok(())
        }
    }

    #[test]
    fn tasklet_step_should_repeat_until_finished() {
        let tasklet = CountingTasklet {
            calls: Cell::new(0),
            until: 3,
        };
        let step = StepBuilder::new("count").tasklet(&tasklet).build();
        let mut execution = StepExecution::new(step.get_name());

        step.execute(&mut execution).unwrap();

        assert_eq!(tasklet.calls.get(), 3);
        assert_eq!(execution.status, StepStatus::Success);
    }

    #[test]
    fn failing_tasklet_should_fail_the_step() {
        let step = StepBuilder::new("fail").tasklet(&FailingTasklet).build();
        let mut execution = StepExecution::new(step.get_name());

        let result = step.execute(&mut execution);

        assert!(matches!(result, Err(BatchError::Step(name)) if name == "fail"));
        assert_eq!(execution.status, StepStatus::Failed);
    }

    #[test]
    fn chunk_step_should_write_every_item_in_chunks() {
        let reader = VecReader::new(vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
        let writer = CollectingWriter::default();
        let step = StepBuilder::new("double")
            .chunk(2)
            .reader(&reader)
            .processor(&DoubleProcessor)
            .writer(&writer)
            .build()
            .unwrap();
        let mut execution = StepExecution::new(step.get_name());

        step.execute(&mut execution).unwrap();

        assert_eq!(
            *writer.chunks.borrow(),
            vec![vec![2, 4], vec![6, 8], vec![10]]
        );
        assert_eq!(execution.read_count, 5);
        assert_eq!(execution.write_count, 5);
        assert!(writer.opened.get());
        assert!(writer.closed.get());
    }

    #[test]
    fn chunk_step_should_succeed_on_empty_input() {
        let reader = VecReader::new(vec![]);
        let writer = CollectingWriter::default();
        let step = StepBuilder::new("empty")
            .chunk(3)
            .reader(&reader)
            .processor(&DoubleProcessor)
            .writer(&writer)
            .build()
            .unwrap();
        let mut execution = StepExecution::new(step.get_name());

        step.execute(&mut execution).unwrap();

        assert!(writer.chunks.borrow().is_empty());
        assert_eq!(execution.status, StepStatus::Success);
    }

    #[test]
    fn chunk_step_should_tolerate_errors_up_to_skip_limit() {
        let reader = VecReader::new(vec![Some(1), None, Some(3)]);
        let writer = CollectingWriter::default();
        let step = StepBuilder::new("skip")
            .chunk(10)
            .reader(&reader)
            .processor(&DoubleProcessor)
            .writer(&writer)
            .skip_limit(1)
            .build()
            .unwrap();
        let mut execution = StepExecution::new(step.get_name());

        step.execute(&mut execution).unwrap();

        assert_eq!(*writer.chunks.borrow(), vec![vec![2, 6]]);
        assert_eq!(execution.read_error_count, 1);
    }

    #[test]
    fn chunk_step_should_fail_when_skip_limit_is_exceeded() {
        let reader = VecReader::new(vec![None, Some(2)]);
        let writer = CollectingWriter::default();
        let step = StepBuilder::new("strict")
            .chunk(10)
            .reader(&reader)
            .processor(&DoubleProcessor)
            .writer(&writer)
            .build()
            .unwrap();
        let mut execution = StepExecution::new(step.get_name());

        assert!(step.execute(&mut execution).is_err());
        assert_eq!(execution.status, StepStatus::ReadError);
        assert!(writer.closed.get());
    }

    /// Writes every item except the odd ones.
    struct EvenOnlyWriter {
        written: RefCell<Vec<u32>>,
    }

    impl ItemWriter<u32> for EvenOnlyWriter {
        fn write(&self, items: &[u32]) -> ItemWriterResult {
            let mut failed = 0;
            for item in items {
                if item % 2 == 0 {
                    self.written.borrow_mut().push(*item);
                } else {
                    failed += 1;
                }
            }
            if failed == 0 {
                Ok(())
            } else {
                Err(BatchError::PartialWrite {
                    failed,
                    message: "odd item".to_string(),
                })
            }
        }
    }

    #[test]
    fn partial_write_should_only_count_failed_items() {
        let reader = VecReader::new(vec![Some(2), Some(3), Some(4), Some(5)]);
        let writer = EvenOnlyWriter {
            written: RefCell::new(vec![]),
        };
        let step = StepBuilder::new("partial")
            .chunk(10)
            .reader(&reader)
            .processor(&PassThrough)
            .writer(&writer)
            .skip_limit(2)
            .build()
            .unwrap();
        let mut execution = StepExecution::new(step.get_name());

        step.execute(&mut execution).unwrap();

        assert_eq!(*writer.written.borrow(), vec![2, 4]);
        assert_eq!(execution.write_count, 2);
        assert_eq!(execution.write_error_count, 2);
    }

    #[test]
    fn partial_write_beyond_skip_limit_should_fail_the_step() {
        let reader = VecReader::new(vec![Some(1), Some(2), Some(3)]);
        let writer = EvenOnlyWriter {
            written: RefCell::new(vec![]),
        };
        let step = StepBuilder::new("partial")
            .chunk(10)
            .reader(&reader)
            .processor(&PassThrough)
            .writer(&writer)
            .skip_limit(1)
            .build()
            .unwrap();
        let mut execution = StepExecution::new(step.get_name());

        assert!(step.execute(&mut execution).is_err());
        assert_eq!(execution.status, StepStatus::WriteError);
        assert_eq!(execution.write_error_count, 2);
    }

    #[test]
    fn builder_should_reject_missing_writer() {
        let reader = VecReader::new(vec![]);
        let result = StepBuilder::new("incomplete")
            .chunk::<u32, u32>(1)
            .reader(&reader)
            .processor(&DoubleProcessor)
            .build();

        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }
}
