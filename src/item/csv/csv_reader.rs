use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use std::{cell::RefCell, fs::File, io::Read, path::Path};

use crate::{
    core::item::{ItemReader, ItemReaderResult},
    error::BatchError,
};

use super::Row;

/// A CSV item reader yielding one [`Row`] per data line.
///
/// The first line of the source is the header: its column names become the
/// keys of every row, in column order. Field values are trimmed.
///
/// # Examples
///
/// ```
/// use dspace_csv_archive::item::csv::csv_reader::CsvItemReaderBuilder;
/// use dspace_csv_archive::core::item::ItemReader;
///
/// let data = "\
/// dc.title,files
/// Hello,./a.pdf
/// ";
///
/// let reader = CsvItemReaderBuilder::new().from_reader(data.as_bytes());
///
/// let row = reader.read().unwrap().unwrap();
/// assert_eq!(row["dc.title"], "Hello");
/// assert_eq!(row["files"], "./a.pdf");
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct CsvItemReader<R> {
    /// Uses `RefCell` so records can be pulled through the `&self` signature
    /// of the `ItemReader` trait.
    reader: RefCell<Reader<R>>,
    /// Header record, loaded on the first read.
    headers: RefCell<Option<StringRecord>>,
}

impl<R: Read> CsvItemReader<R> {
    fn headers(&self) -> Result<StringRecord, BatchError> {
        if let Some(headers) = self.headers.borrow().as_ref() {
            return Ok(headers.clone());
        }

        let headers = self
            .reader
            .borrow_mut()
            .headers()
            .map_err(|error| BatchError::ItemReader(error.to_string()))?
            .clone();

        *self.headers.borrow_mut() = Some(headers.clone());
        Ok(headers)
    }
}

impl<R: Read> ItemReader<Row> for CsvItemReader<R> {
    /// Reads the next line of the CSV source.
    ///
    /// # Returns
    /// - `Ok(Some(row))` if a line is successfully read
    /// - `Ok(None)` if there are no more lines to read
    /// - `Err(BatchError::ItemReader(error))` on malformed input
    fn read(&self) -> ItemReaderResult<Row> {
        let headers = self.headers()?;
        let mut record = StringRecord::new();

        let has_record = self
            .reader
            .borrow_mut()
            .read_record(&mut record)
            .map_err(|error| BatchError::ItemReader(error.to_string()))?;

        if !has_record {
            return Ok(None);
        }

        record
            .deserialize::<Row>(Some(&headers))
            .map(Some)
            .map_err(|error| BatchError::ItemReader(error.to_string()))
    }
}

/// A builder for configuring CSV item reading.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Trimming: All fields trimmed
#[derive(Default)]
pub struct CsvItemReaderBuilder {
    /// The delimiter character (default: comma ',')
    delimiter: u8,
}

impl CsvItemReaderBuilder {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Sets the field delimiter.
    ///
    /// This is the CSV column separator, not the separator between multiple
    /// values inside one cell.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false);
        builder
    }

    /// Creates a `CsvItemReader` from any `Read` source.
    pub fn from_reader<R: Read>(self, rdr: R) -> CsvItemReader<R> {
        CsvItemReader {
            reader: RefCell::new(self.builder().from_reader(rdr)),
            headers: RefCell::new(None),
        }
    }

    /// Creates a `CsvItemReader` from a file path.
    ///
    /// # Errors
    /// Returns `BatchError::Io` if the file cannot be opened.
    pub fn from_path<P: AsRef<Path>>(self, path: P) -> Result<CsvItemReader<File>, BatchError> {
        let file = File::open(path)?;
        Ok(self.from_reader(file))
    }
}
