#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # DSpace CSV Archive

 Converts a tabular metadata export (CSV) into a DSpace Simple Archive Format
 (SAF) package: one directory per item holding its Dublin Core metadata
 documents, a `contents` manifest, its bitstreams and its target collections,
 finally compressed into a single ZIP archive.

 ## Core Concepts

 The conversion runs as a small batch job:

- **Job:** the whole conversion, composed of `Step`s run in order.
- **Step:** either chunk oriented (read, process, write) or a single `Tasklet`.
- **ItemReader:** `CsvItemReader` yields one row per CSV line.
- **ItemProcessor:** `RowItemProcessor` turns a row into an archive `Item`.
- **ItemWriter:** `SafItemWriter` writes each item directory.
- **Tasklet:** `ZipTasklet` compresses the finished tree.

 ## Metadata model

 Column names are qualified field names, `schema.element.qualifier[language]`,
 for example `dc.contributor.author[en]`. The `files` column lists bitstream
 paths. A cell holding several values separates them with `||`. Every schema
 used by an item gets its own XML document:

```rust
use dspace_csv_archive::item::saf::item::Item;

let item = Item::builder()
    .set("dc.title", "Hello||World")
    .set("dc.contributor.author[en]", "Jane Doe")
    .set("files", "./a.pdf")
    .build();

assert_eq!(item.used_schemas(), vec!["dc"]);
assert!(item.to_xml("dc").unwrap().contains(
    "<dcvalue element=\"contributor\" qualifier=\"author\" language=\"en\">Jane Doe</dcvalue>"
));
```

 ## Features

| **Feature**   | **Description**                                               |
|---------------|---------------------------------------------------------------|
| csv           | Enables the CSV `ItemReader` and the row processor             |
| zip           | Enables the ZIP `Tasklet`                                      |
| full          | Enables all available features                                 |

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of items readers / writers (csv reader, SAF writer)
pub mod item;

/// Set of tasklets (zip)
pub mod tasklet;

#[cfg(all(feature = "csv", feature = "zip"))]
/// Complete CSV to SAF conversion job
pub mod archive;
