use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::error::BatchError;

use super::handles::HandleTable;

/// Separator between multiple values of one cell.
pub const DEFAULT_DELIMITER: &str = "||";

/// Field holding the document types that select the target collections.
pub const TYPE_FIELD: &str = "dc.type";

/// What a CSV column feeds into an [`Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column<'a> {
    /// Bitstream source paths.
    Files,
    /// Explicit collection list. Collections are resolved from `dc.type`, so
    /// this column is not carried into the item.
    Collections,
    /// A qualified metadata field.
    Metadata(&'a str),
}

impl<'a> From<&'a str> for Column<'a> {
    fn from(name: &'a str) -> Self {
        match name {
            "files" => Column::Files,
            "collections" => Column::Collections,
            field => Column::Metadata(field),
        }
    }
}

/// One entry of a Simple Archive Format package.
///
/// An item is built once through [`ItemBuilder`] and is read-only afterwards.
/// Its attribute map only holds metadata fields, in insertion order, so that
/// serialization is byte-stable.
///
/// ```
/// use dspace_csv_archive::item::saf::item::Item;
///
/// let item = Item::builder()
///     .set("dc.title", "Hello||World")
///     .set("files", "./a.pdf || ./sub/b.pdf")
///     .build();
///
/// assert_eq!(item.attribute("dc.title").unwrap(), "Hello||World");
/// assert_eq!(item.files(), vec!["a.pdf", "b.pdf"]);
/// assert_eq!(item.file_paths(), vec!["./a.pdf", "./sub/b.pdf"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) attributes: IndexMap<String, String>,
    files: String,
    delimiter: String,
}

impl Item {
    pub fn builder() -> ItemBuilder {
        ItemBuilder::new()
    }

    /// Returns the raw value of a metadata field.
    ///
    /// # Errors
    /// `BatchError::KeyNotFound` if the field was never set.
    pub fn attribute(&self, name: &str) -> Result<&str, BatchError> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| BatchError::KeyNotFound(name.to_string()))
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Bare file names of the bitstreams, as named inside the archive.
    pub fn files(&self) -> Vec<String> {
        self.split_values(&self.files)
            .map(|path| {
                Path::new(path)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string())
            })
            .collect()
    }

    /// Bitstream source paths as given in the export.
    pub fn file_paths(&self) -> Vec<String> {
        self.split_values(&self.files).map(str::to_string).collect()
    }

    /// Handles of the collections this item is imported into.
    ///
    /// Each `dc.type` value is looked up in `handles`. An unknown type is
    /// logged and passed through unmapped. An item without `dc.type` has no
    /// collections.
    pub fn collections(&self, handles: &HandleTable) -> Vec<String> {
        let Some(types) = self.attributes.get(TYPE_FIELD) else {
            debug!("Item has no {} field, no collection assigned", TYPE_FIELD);
            return Vec::new();
        };

        self.split_values(types)
            .map(|type_name| match handles.resolve(type_name) {
                Some(handle) => handle.to_string(),
                None => {
                    warn!("This collection does not exist: {}", type_name);
                    type_name.to_string()
                }
            })
            .collect()
    }

    /// Splits a raw cell on the delimiter, trims each value and skips blanks.
    pub(crate) fn split_values<'a>(&'a self, raw: &'a str) -> impl Iterator<Item = &'a str> {
        let values: Box<dyn Iterator<Item = &'a str>> = if self.delimiter.is_empty() {
            Box::new(std::iter::once(raw))
        } else {
            Box::new(raw.split(self.delimiter.as_str()))
        };
        values.map(str::trim).filter(|value| !value.is_empty())
    }
}

/// Builder for [`Item`], fed one CSV column at a time.
#[derive(Debug, Clone)]
pub struct ItemBuilder {
    attributes: IndexMap<String, String>,
    files: String,
    delimiter: String,
}

impl Default for ItemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemBuilder {
    pub fn new() -> Self {
        Self {
            attributes: IndexMap::new(),
            files: String::new(),
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }

    /// Sets the separator between multiple values of one cell.
    pub fn delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = delimiter.to_string();
        self
    }

    /// Routes a column to its slot: bitstreams, ignored collections, or
    /// metadata. The field name is not validated.
    pub fn set(self, name: &str, value: &str) -> Self {
        match Column::from(name) {
            Column::Files => self.files(value),
            Column::Collections => {
                debug!("Ignoring collections column, collections come from {}", TYPE_FIELD);
                self
            }
            Column::Metadata(field) => self.attribute(field, value),
        }
    }

    /// Stores a metadata field, replacing any previous value.
    pub fn attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Sets the delimiter-joined list of bitstream paths.
    pub fn files(mut self, files: &str) -> Self {
        self.files = files.to_string();
        self
    }

    pub fn build(self) -> Item {
        Item {
            attributes: self.attributes,
            files: self.files,
            delimiter: self.delimiter,
        }
    }
}
