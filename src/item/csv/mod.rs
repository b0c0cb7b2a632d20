//! CSV support for reading metadata exports.
//!
//! A metadata export has one header line naming the columns (qualified field
//! names such as `dc.contributor.author[en]`, plus the `files` and
//! `collections` columns) followed by one line per archive item.
//!
//! # Examples
//!
//! ```
//! use dspace_csv_archive::item::csv::csv_reader::CsvItemReaderBuilder;
//! use dspace_csv_archive::core::item::ItemReader;
//!
//! let csv_data = "\
//! dc.title,dc.type,files
//! A study,article,./study.pdf
//! Some slides,courseMaterial,./slides.pdf||./notes.txt
//! ";
//!
//! let reader = CsvItemReaderBuilder::new().from_reader(csv_data.as_bytes());
//!
//! let mut rows = Vec::new();
//! while let Some(row) = reader.read().unwrap() {
//!     rows.push(row);
//! }
//!
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[1]["files"], "./slides.pdf||./notes.txt");
//! ```
use indexmap::IndexMap;

/// One CSV line: column name to cell value, in column order.
pub type Row = IndexMap<String, String>;

/// A module providing facilities for reading CSV data records.
pub mod csv_reader;
