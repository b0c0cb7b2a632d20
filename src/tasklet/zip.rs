//! # Zip Archive Tasklet
//!
//! Compresses a Simple Archive Format directory tree into a single ZIP file,
//! the form in which DSpace batch imports are uploaded.
//!
//! Entries are stored relative to the source directory and added in sorted
//! order with a fixed timestamp, so the same tree always yields the same
//! archive.
//!
//! ```rust
//! use dspace_csv_archive::core::step::{Step, StepBuilder, StepExecution};
//! use dspace_csv_archive::tasklet::zip::ZipTaskletBuilder;
//! use std::fs;
//! use std::env::temp_dir;
//!
//! # fn example() -> Result<(), dspace_csv_archive::BatchError> {
//! let saf_dir = temp_dir().join("doc_saf");
//! fs::create_dir_all(saf_dir.join("item_000")).unwrap();
//! fs::write(saf_dir.join("item_000/contents"), "a.pdf\n").unwrap();
//!
//! let archive_path = temp_dir().join("doc_saf.zip");
//!
//! let zip_tasklet = ZipTaskletBuilder::new()
//!     .source_path(&saf_dir)
//!     .target_path(&archive_path)
//!     .compression_level(6)
//!     .build()?;
//!
//! let step = StepBuilder::new("zip-saf").tasklet(&zip_tasklet).build();
//!
//! let mut step_execution = StepExecution::new("zip-saf");
//! step.execute(&mut step_execution)?;
//!
//! fs::remove_file(&archive_path).ok();
//! fs::remove_dir_all(&saf_dir).ok();
//! # Ok(())
//! # }
//! ```

use crate::{
    BatchError,
    core::step::{RepeatStatus, StepExecution, Tasklet},
};
use log::{debug, info};
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};
use zip::{CompressionMethod, DateTime, ZipWriter, write::SimpleFileOptions};

/// A tasklet creating a ZIP archive from a directory (or a single file).
pub struct ZipTasklet {
    /// Source path to compress (file or directory)
    source_path: PathBuf,
    /// Target ZIP file path
    target_path: PathBuf,
    /// Compression level (0-9, where 0 stores entries uncompressed)
    compression_level: i32,
}

impl ZipTasklet {
    /// Creates a new ZipTasklet with the default compression level.
    ///
    /// The source is checked when the tasklet runs, since it is usually
    /// produced by an earlier step of the same job. The parent directory of
    /// the target is created if needed.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        source_path: P,
        target_path: Q,
    ) -> Result<Self, BatchError> {
        let target = target_path.as_ref().to_path_buf();

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    BatchError::Configuration(format!(
                        "Cannot create target directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(Self {
            source_path: source_path.as_ref().to_path_buf(),
            target_path: target,
            compression_level: 6,
        })
    }

    pub fn set_compression_level(&mut self, level: i32) {
        self.compression_level = level.clamp(0, 9);
    }

    fn file_options(&self) -> SimpleFileOptions {
        let options = SimpleFileOptions::default().last_modified_time(DateTime::default());
        if self.compression_level == 0 {
            // Deflated with level 0 trips some ZIP readers
            options.compression_method(CompressionMethod::Stored)
        } else {
            options
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.compression_level as i64))
        }
    }

    fn compress_file(
        &self,
        zip_writer: &mut ZipWriter<File>,
        file_path: &Path,
        archive_path: &str,
    ) -> Result<(), BatchError> {
        debug!(
            "Compressing file: {} -> {}",
            file_path.display(),
            archive_path
        );

        zip_writer
            .start_file(archive_path, self.file_options())
            .map_err(|e| BatchError::Io(io::Error::other(e)))?;

        let file_content = fs::read(file_path)?;
        zip_writer.write_all(&file_content)?;
        Ok(())
    }

    /// Recursively compresses a directory, entries sorted by name.
    ///
    /// # Returns
    /// The number of files compressed.
    fn compress_directory(
        &self,
        zip_writer: &mut ZipWriter<File>,
        dir_path: &Path,
    ) -> Result<usize, BatchError> {
        let mut entries = fs::read_dir(dir_path)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, io::Error>>()?;
        entries.sort();

        let mut file_count = 0;
        for entry_path in entries {
            if entry_path.is_dir() {
                file_count += self.compress_directory(zip_writer, &entry_path)?;
            } else if entry_path.is_file() {
                let archive_path = entry_path
                    .strip_prefix(&self.source_path)
                    .unwrap_or(&entry_path)
                    .to_string_lossy()
                    .replace('\\', "/");
                self.compress_file(zip_writer, &entry_path, &archive_path)?;
                file_count += 1;
            }
        }

        Ok(file_count)
    }
}

impl Tasklet for ZipTasklet {
    fn execute(&self, _step_execution: &StepExecution) -> Result<RepeatStatus, BatchError> {
        info!(
            "Starting ZIP compression: {} -> {}",
            self.source_path.display(),
            self.target_path.display()
        );

        if !self.source_path.exists() {
            return Err(BatchError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Source path does not exist: {}", self.source_path.display()),
            )));
        }

        let zip_file = File::create(&self.target_path)?;
        let mut zip_writer = ZipWriter::new(zip_file);

        let file_count = if self.source_path.is_dir() {
            self.compress_directory(&mut zip_writer, &self.source_path)?
        } else {
            let archive_name = self
                .source_path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            self.compress_file(&mut zip_writer, &self.source_path, &archive_name)?;
            1
        };

        zip_writer
            .finish()
            .map_err(|e| BatchError::Io(io::Error::other(e)))?;

        info!(
            "ZIP compression completed. {} files compressed to {}",
            file_count,
            self.target_path.display()
        );

        Ok(RepeatStatus::Finished)
    }
}

/// Builder for [`ZipTasklet`].
pub struct ZipTaskletBuilder {
    source_path: Option<PathBuf>,
    target_path: Option<PathBuf>,
    compression_level: i32,
}

impl Default for ZipTaskletBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipTaskletBuilder {
    pub fn new() -> Self {
        Self {
            source_path: None,
            target_path: None,
            compression_level: 6,
        }
    }

    pub fn source_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn target_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.target_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Compression level, clamped to 0-9. Level 0 stores entries.
    pub fn compression_level(mut self, level: i32) -> Self {
        self.compression_level = level.clamp(0, 9);
        self
    }

    pub fn build(self) -> Result<ZipTasklet, BatchError> {
        let source_path = self
            .source_path
            .ok_or_else(|| BatchError::Configuration("Source path is required".to_string()))?;
        let target_path = self
            .target_path
            .ok_or_else(|| BatchError::Configuration("Target path is required".to_string()))?;

        let mut tasklet = ZipTasklet::new(source_path, target_path)?;
        tasklet.set_compression_level(self.compression_level);
        Ok(tasklet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn saf_tree(root: &Path) -> io::Result<()> {
        fs::create_dir_all(root.join("item_000"))?;
        fs::create_dir_all(root.join("item_001"))?;
        fs::write(root.join("item_000/dublin_core.xml"), "<dublin_core schema=\"dc\">\n</dublin_core>\n")?;
        fs::write(root.join("item_000/contents"), "a.pdf\n")?;
        fs::write(root.join("item_001/contents"), "")?;
        Ok(())
    }

    fn entry_names(archive_path: &Path) -> Vec<String> {
        let mut archive = ZipArchive::new(File::open(archive_path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn directory_should_be_archived_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("saf");
        saf_tree(&source).unwrap();
        let target = temp.path().join("saf.zip");

        let tasklet = ZipTaskletBuilder::new()
            .source_path(&source)
            .target_path(&target)
            .build()
            .unwrap();
        let result = tasklet.execute(&StepExecution::new("zip")).unwrap();

        assert_eq!(result, RepeatStatus::Finished);
        assert_eq!(
            entry_names(&target),
            vec!["item_000/contents", "item_000/dublin_core.xml", "item_001/contents"]
        );

        let mut archive = ZipArchive::new(File::open(&target).unwrap()).unwrap();
        let mut contents = String::new();
        archive
            .by_name("item_000/contents")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "a.pdf\n");
    }

    #[test]
    fn same_tree_should_give_identical_archives() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("saf");
        saf_tree(&source).unwrap();

        for (name, level) in [("first.zip", 9), ("second.zip", 9)] {
            ZipTaskletBuilder::new()
                .source_path(&source)
                .target_path(temp.path().join(name))
                .compression_level(level)
                .build()
                .unwrap()
                .execute(&StepExecution::new("zip"))
                .unwrap();
        }

        assert_eq!(
            fs::read(temp.path().join("first.zip")).unwrap(),
            fs::read(temp.path().join("second.zip")).unwrap()
        );
    }

    #[test]
    fn level_zero_should_store_entries() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("saf");
        saf_tree(&source).unwrap();
        let target = temp.path().join("stored.zip");

        ZipTaskletBuilder::new()
            .source_path(&source)
            .target_path(&target)
            .compression_level(0)
            .build()
            .unwrap()
            .execute(&StepExecution::new("zip"))
            .unwrap();

        let mut archive = ZipArchive::new(File::open(&target).unwrap()).unwrap();
        let entry = archive.by_name("item_000/contents").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);
    }

    #[test]
    fn missing_source_should_fail_at_execution() {
        let temp = TempDir::new().unwrap();
        let tasklet = ZipTasklet::new(temp.path().join("absent"), temp.path().join("out.zip"))
            .unwrap();

        let result = tasklet.execute(&StepExecution::new("zip"));

        assert!(matches!(result, Err(BatchError::Io(_))));
    }

    #[test]
    fn builder_should_require_paths() {
        let result = ZipTaskletBuilder::new().target_path("out.zip").build();

        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }

    #[test]
    fn compression_level_should_be_clamped() {
        let temp = TempDir::new().unwrap();
        let tasklet = ZipTaskletBuilder::new()
            .source_path(temp.path())
            .target_path(temp.path().join("out.zip"))
            .compression_level(42)
            .build()
            .unwrap();

        assert_eq!(tasklet.compression_level, 9);
    }
}
