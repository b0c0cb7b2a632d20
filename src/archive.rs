//! End-to-end conversion of a CSV metadata export into a SAF package.
//!
//! The job has two steps:
//! 1. `csv-to-saf`: reads rows, builds items and writes one directory per item
//! 2. `zip-saf`: compresses the directory tree into a single archive
//!
//! ```no_run
//! use dspace_csv_archive::archive::SafArchiveBuilder;
//!
//! # fn example() -> Result<(), dspace_csv_archive::BatchError> {
//! let report = SafArchiveBuilder::new("export/metadata.csv").build()?.run()?;
//!
//! println!("{} items in {}", report.item_count, report.output_dir.display());
//! # Ok(())
//! # }
//! ```

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::info;

use crate::{
    BatchError,
    core::{
        job::{Job, JobBuilder, JobExecution},
        step::StepBuilder,
    },
    item::{
        csv::{Row, csv_reader::CsvItemReaderBuilder},
        saf::{
            handles::HandleTable,
            item::{DEFAULT_DELIMITER, Item},
            processor::RowItemProcessor,
            saf_writer::SafItemWriterBuilder,
        },
    },
    tasklet::zip::ZipTaskletBuilder,
};

const SAF_STEP: &str = "csv-to-saf";
const ZIP_STEP: &str = "zip-saf";

/// Summary of a finished conversion.
#[derive(Debug)]
pub struct ArchiveReport {
    pub output_dir: PathBuf,
    /// `None` when compression was disabled.
    pub archive_path: Option<PathBuf>,
    pub item_count: usize,
    pub duration: Duration,
}

/// A configured conversion, created through [`SafArchiveBuilder`].
#[derive(Debug)]
pub struct SafArchive {
    input: PathBuf,
    source_dir: PathBuf,
    output_dir: PathBuf,
    archive_path: Option<PathBuf>,
    delimiter: String,
    csv_delimiter: u8,
    handles: HandleTable,
    compression_level: i32,
    chunk_size: u16,
    skip_limit: u16,
}

impl SafArchive {
    /// Runs the conversion job.
    ///
    /// # Errors
    /// `BatchError::Io` if the input cannot be opened, `BatchError::Step`
    /// naming the failed step otherwise.
    pub fn run(&self) -> Result<ArchiveReport, BatchError> {
        let reader = CsvItemReaderBuilder::new()
            .delimiter(self.csv_delimiter)
            .from_path(&self.input)?;
        let processor = RowItemProcessor::new(&self.delimiter);
        let writer = SafItemWriterBuilder::new()
            .output_dir(&self.output_dir)
            .source_dir(&self.source_dir)
            .handles(self.handles.clone())
            .build()?;

        let saf_step = StepBuilder::new(SAF_STEP)
            .chunk::<Row, Item>(self.chunk_size)
            .reader(&reader)
            .processor(&processor)
            .writer(&writer)
            .skip_limit(self.skip_limit)
            .build()?;

        let job_name = format!("saf-{}", self.input.display());

        let execution: JobExecution = match &self.archive_path {
            Some(archive_path) => {
                let zip_tasklet = ZipTaskletBuilder::new()
                    .source_path(&self.output_dir)
                    .target_path(archive_path)
                    .compression_level(self.compression_level)
                    .build()?;
                let zip_step = StepBuilder::new(ZIP_STEP).tasklet(&zip_tasklet).build();

                JobBuilder::new()
                    .name(job_name)
                    .start(&saf_step)
                    .next(&zip_step)
                    .build()
                    .run()?
            }
            None => JobBuilder::new().name(job_name).start(&saf_step).build().run()?,
        };

        info!(
            "Converted {} items from {} in {:?}",
            execution.write_count,
            self.input.display(),
            execution.duration
        );

        Ok(ArchiveReport {
            output_dir: self.output_dir.clone(),
            archive_path: self.archive_path.clone(),
            item_count: execution.write_count,
            duration: execution.duration,
        })
    }
}

/// Builder for [`SafArchive`].
///
/// Defaults, for an input `/data/export/metadata.csv`:
/// - bitstreams are resolved against `/data/export`
/// - items are written to `/data/export_saf`
/// - the archive is `/data/export_saf.zip`
/// - values inside a cell are separated by `||`, columns by `,`
pub struct SafArchiveBuilder {
    input: PathBuf,
    output_dir: Option<PathBuf>,
    archive_path: Option<PathBuf>,
    zip: bool,
    delimiter: String,
    csv_delimiter: u8,
    handles: HandleTable,
    compression_level: i32,
    chunk_size: u16,
    skip_limit: u16,
}

impl SafArchiveBuilder {
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output_dir: None,
            archive_path: None,
            zip: true,
            delimiter: DEFAULT_DELIMITER.to_string(),
            csv_delimiter: b',',
            handles: HandleTable::default(),
            compression_level: 6,
            chunk_size: 10,
            skip_limit: 0,
        }
    }

    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn archive_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.archive_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Whether to compress the output directory, default: true.
    pub fn zip(mut self, zip: bool) -> Self {
        self.zip = zip;
        self
    }

    /// Separator between multiple values of one cell.
    pub fn delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = delimiter.to_string();
        self
    }

    /// CSV column separator.
    pub fn csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = delimiter;
        self
    }

    pub fn handles(mut self, handles: HandleTable) -> Self {
        self.handles = handles;
        self
    }

    pub fn compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    pub fn chunk_size(mut self, chunk_size: u16) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Number of failing rows tolerated before the job fails, default: 0.
    pub fn skip_limit(mut self, skip_limit: u16) -> Self {
        self.skip_limit = skip_limit;
        self
    }

    pub fn build(self) -> Result<SafArchive, BatchError> {
        if self.delimiter.is_empty() {
            return Err(BatchError::Configuration(
                "Value delimiter must not be empty".to_string(),
            ));
        }

        let parent = match self.input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let source_dir = fs::canonicalize(parent)?;

        let output_dir = self
            .output_dir
            .unwrap_or_else(|| with_suffix(&source_dir, "_saf"));

        let archive_path = match (self.zip, self.archive_path) {
            (false, _) => None,
            (true, Some(path)) => Some(path),
            (true, None) => Some(with_suffix(&output_dir, ".zip")),
        };

        Ok(SafArchive {
            input: self.input,
            source_dir,
            output_dir,
            archive_path,
            delimiter: self.delimiter,
            csv_delimiter: self.csv_delimiter,
            handles: self.handles,
            compression_level: self.compression_level,
            chunk_size: self.chunk_size,
            skip_limit: self.skip_limit,
        })
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
