use std::{
    cell::Cell,
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use crate::{
    core::item::{ItemWriter, ItemWriterResult},
    error::BatchError,
};

use super::{dublin_core::metadata_file_name, handles::HandleTable, item::Item};

const CONTENTS_FILE: &str = "contents";
const COLLECTIONS_FILE: &str = "collections";
const ITEM_PREFIX: &str = "item_";
/// Prefix of the directory an item is assembled in before it is renamed.
const STAGING_PREFIX: &str = ".staging_";

/// Writes items as a Simple Archive Format directory tree.
///
/// Each item gets its own `item_NNN` directory under the output root with
/// one metadata document per schema, a `contents` manifest, copies of its
/// bitstreams and, when any collection resolves, a `collections` file.
///
/// An item is assembled in a staging directory and only renamed to
/// `item_NNN` once complete, so a failed item leaves nothing behind. Its
/// number stays used. Every item of a chunk is attempted: when only some
/// fail, `write` returns `BatchError::PartialWrite` with the failure count.
///
/// ```no_run
/// use dspace_csv_archive::core::item::ItemWriter;
/// use dspace_csv_archive::item::saf::{item::Item, saf_writer::SafItemWriterBuilder};
///
/// let writer = SafItemWriterBuilder::new()
///     .output_dir("./export_saf")
///     .source_dir("./export")
///     .build()
///     .unwrap();
///
/// let item = Item::builder()
///     .set("dc.title", "A study")
///     .set("dc.type", "article")
///     .set("files", "study.pdf")
///     .build();
///
/// writer.open().unwrap();
/// writer.write(&[item]).unwrap();
/// ```
pub struct SafItemWriter {
    output_dir: PathBuf,
    source_dir: PathBuf,
    handles: HandleTable,
    /// Number given to the next item directory.
    next_index: Cell<usize>,
    written: Cell<usize>,
}

impl SafItemWriter {
    fn write_item(&self, item: &Item) -> Result<(), BatchError> {
        let index = self.next_index.get();
        self.next_index.set(index + 1);

        let name = format!("{}{:03}", ITEM_PREFIX, index);
        let item_dir = self.output_dir.join(&name);
        let staging_dir = self.output_dir.join(format!("{}{}", STAGING_PREFIX, name));

        let result = self
            .fill_item_dir(item, &staging_dir)
            .and_then(|bitstreams| {
                fs::rename(&staging_dir, &item_dir).map_err(|e| {
                    BatchError::ItemWriter(format!(
                        "Cannot move item into {}: {}",
                        item_dir.display(),
                        e
                    ))
                })?;
                Ok(bitstreams)
            });

        match result {
            Ok(bitstreams) => {
                self.written.set(self.written.get() + 1);
                debug!(
                    "Wrote {} with {} bitstreams",
                    item_dir.display(),
                    bitstreams
                );
                Ok(())
            }
            Err(error) => {
                if staging_dir.exists() {
                    if let Err(e) = fs::remove_dir_all(&staging_dir) {
                        warn!("Cannot remove {}: {}", staging_dir.display(), e);
                    }
                }
                Err(error)
            }
        }
    }

    /// Writes the content of one item into `dir`, returning its bitstream count.
    fn fill_item_dir(&self, item: &Item, dir: &Path) -> Result<usize, BatchError> {
        let schemas = item
            .used_schemas()
            .into_iter()
            .map(|schema| metadata_file_name(&schema).map(|file_name| (file_name, schema)))
            .collect::<Result<Vec<_>, BatchError>>()?;

        let file_names = item.files();
        check_bitstream_names(&file_names, schemas.iter().map(|(name, _)| name.as_str()))?;

        fs::create_dir_all(dir).map_err(|e| {
            BatchError::ItemWriter(format!(
                "Cannot create item directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        for (file_name, schema) in &schemas {
            write_file(&dir.join(file_name), &item.to_xml(schema)?)?;
        }

        for (name, path) in file_names.iter().zip(item.file_paths()) {
            let source = self.source_dir.join(&path);
            fs::copy(&source, dir.join(name)).map_err(|e| {
                BatchError::ItemWriter(format!(
                    "Cannot copy bitstream {}: {}",
                    source.display(),
                    e
                ))
            })?;
        }
        write_file(&dir.join(CONTENTS_FILE), &lines(&file_names))?;

        let collections = item.collections(&self.handles);
        if !collections.is_empty() {
            write_file(&dir.join(COLLECTIONS_FILE), &lines(&collections))?;
        }

        Ok(file_names.len())
    }

    /// Removes item directories left in the output root by an earlier run.
    fn clear_output_dir(&self) -> Result<(), BatchError> {
        let stale_error = |e: std::io::Error| {
            BatchError::ItemWriter(format!(
                "Cannot clear output directory {}: {}",
                self.output_dir.display(),
                e
            ))
        };

        for entry in fs::read_dir(&self.output_dir).map_err(stale_error)? {
            let path = entry.map_err(stale_error)?.path();
            let is_item = path
                .file_name()
                .map(|name| name.to_string_lossy())
                .is_some_and(|name| {
                    name.starts_with(ITEM_PREFIX) || name.starts_with(STAGING_PREFIX)
                });

            if is_item && path.is_dir() {
                debug!("Removing stale item directory {}", path.display());
                fs::remove_dir_all(&path).map_err(stale_error)?;
            }
        }
        Ok(())
    }
}

impl ItemWriter<Item> for SafItemWriter {
    fn write(&self, items: &[Item]) -> ItemWriterResult {
        let mut errors = items
            .iter()
            .filter_map(|item| self.write_item(item).err())
            .collect::<Vec<_>>();

        for error in &errors {
            warn!("Item not written: {}", error);
        }

        match errors.len() {
            0 => Ok(()),
            1 if items.len() == 1 => Err(errors.remove(0)),
            failed => Err(BatchError::PartialWrite {
                failed,
                message: errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            }),
        }
    }

    fn open(&self) -> ItemWriterResult {
        fs::create_dir_all(&self.output_dir).map_err(|e| {
            BatchError::ItemWriter(format!(
                "Cannot create output directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;
        self.clear_output_dir()?;
        self.next_index.set(0);
        self.written.set(0);
        info!("Writing archive items to {}", self.output_dir.display());
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        info!(
            "{} archive items written to {}",
            self.written.get(),
            self.output_dir.display()
        );
        Ok(())
    }
}

/// Bitstream names must be unique within an item and must not collide with
/// the manifest or metadata files.
fn check_bitstream_names<'a>(
    file_names: &[String],
    metadata_files: impl Iterator<Item = &'a str>,
) -> Result<(), BatchError> {
    let reserved: HashSet<&str> = [CONTENTS_FILE, COLLECTIONS_FILE]
        .into_iter()
        .chain(metadata_files)
        .collect();
    let mut seen = HashSet::new();

    for name in file_names {
        if reserved.contains(name.as_str()) {
            return Err(BatchError::ItemWriter(format!(
                "Bitstream name {} is reserved",
                name
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(BatchError::ItemWriter(format!(
                "Bitstream name {} is used twice",
                name
            )));
        }
    }
    Ok(())
}

fn lines(values: &[String]) -> String {
    values.iter().map(|value| format!("{}\n", value)).collect()
}

fn write_file(path: &Path, content: &str) -> Result<(), BatchError> {
    fs::write(path, content)
        .map_err(|e| BatchError::ItemWriter(format!("Cannot write {}: {}", path.display(), e)))
}

/// Builder for [`SafItemWriter`].
///
/// - `output_dir` is required.
/// - `source_dir` resolves relative bitstream paths, default: current directory.
/// - `handles` maps `dc.type` values to collections, default: the built-in table.
#[derive(Default)]
pub struct SafItemWriterBuilder {
    output_dir: Option<PathBuf>,
    source_dir: Option<PathBuf>,
    handles: Option<HandleTable>,
}

impl SafItemWriterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn source_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn handles(mut self, handles: HandleTable) -> Self {
        self.handles = Some(handles);
        self
    }

    pub fn build(self) -> Result<SafItemWriter, BatchError> {
        let output_dir = self.output_dir.ok_or_else(|| {
            BatchError::Configuration("Output directory is required".to_string())
        })?;

        Ok(SafItemWriter {
            output_dir,
            source_dir: self.source_dir.unwrap_or_else(|| PathBuf::from(".")),
            handles: self.handles.unwrap_or_default(),
            next_index: Cell::new(0),
            written: Cell::new(0),
        })
    }
}
