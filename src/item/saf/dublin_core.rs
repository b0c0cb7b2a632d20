//! Dublin Core XML serialization of an [`Item`].
//!
//! DSpace imports one document per metadata schema:
//!
//! ```text
//! <dublin_core schema="dc">
//! <dcvalue element="title">Hello</dcvalue>
//! <dcvalue element="contributor" qualifier="author" language="en">Jane Doe</dcvalue>
//! </dublin_core>
//! ```

use indexmap::IndexSet;
use quick_xml::{
    Writer,
    escape::unescape,
    events::{BytesEnd, BytesStart, BytesText, Event},
};

use crate::error::BatchError;

use super::{
    item::Item,
    qualified_name::{DCVALUE_TAG, QualifiedName, escape_value, schema_of},
};

const DUBLIN_CORE_TAG: &str = "dublin_core";

/// Schema whose document is named `dublin_core.xml`.
pub const DEFAULT_SCHEMA: &str = "dc";

/// File name of the metadata document for `schema` inside an item directory.
///
/// `schema` is the escaped form returned by [`Item::used_schemas`]; the file
/// name uses the unescaped text.
///
/// # Errors
/// `BatchError::ItemWriter` if the schema is not valid escaped text or holds
/// a path separator.
pub fn metadata_file_name(schema: &str) -> Result<String, BatchError> {
    let name = unescape(schema).map_err(|error| {
        BatchError::ItemWriter(format!("Invalid schema {}: {}", schema, error))
    })?;

    if name.contains(['/', '\\']) {
        return Err(BatchError::ItemWriter(format!(
            "Schema {} cannot be used as a file name",
            name
        )));
    }

    if name == DEFAULT_SCHEMA {
        Ok("dublin_core.xml".to_string())
    } else {
        Ok(format!("metadata_{}.xml", name))
    }
}

impl Item {
    /// Distinct escaped schemas of the item's fields, in first-seen order.
    pub fn used_schemas(&self) -> Vec<String> {
        self.attributes
            .keys()
            .map(|name| schema_of(name))
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Serializes every field of `schema` into a `<dublin_core>` document.
    ///
    /// `schema` is compared with, and written as, the escaped form returned
    /// by [`Item::used_schemas`]. Each delimited value becomes its own
    /// `<dcvalue>` element; blank values are skipped. Lines end with `\n`.
    ///
    /// ```
    /// use dspace_csv_archive::item::saf::item::Item;
    ///
    /// let item = Item::builder()
    ///     .set("dc.title", "Hello||World")
    ///     .set("dc.contributor.author[en]", "Jane Doe")
    ///     .build();
    ///
    /// assert_eq!(
    ///     item.to_xml("dc").unwrap(),
    ///     "<dublin_core schema=\"dc\">\n\
    ///      <dcvalue element=\"title\">Hello</dcvalue>\n\
    ///      <dcvalue element=\"title\">World</dcvalue>\n\
    ///      <dcvalue element=\"contributor\" qualifier=\"author\" language=\"en\">Jane Doe</dcvalue>\n\
    ///      </dublin_core>\n"
    /// );
    /// ```
    pub fn to_xml(&self, schema: &str) -> Result<String, BatchError> {
        let mut writer = Writer::new(Vec::new());

        let mut root = BytesStart::new(DUBLIN_CORE_TAG);
        root.push_attribute(("schema".as_bytes(), schema.as_bytes()));
        write_line(&mut writer, Event::Start(root))?;

        for (name, raw_value) in &self.attributes {
            let field = QualifiedName::parse(name);
            if field.schema() != schema {
                continue;
            }

            for value in self.split_values(raw_value) {
                write_event(&mut writer, Event::Start(field.dcvalue_start()))?;
                write_event(
                    &mut writer,
                    Event::Text(BytesText::from_escaped(escape_value(value))),
                )?;
                write_line(&mut writer, Event::End(BytesEnd::new(DCVALUE_TAG)))?;
            }
        }

        write_line(&mut writer, Event::End(BytesEnd::new(DUBLIN_CORE_TAG)))?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| BatchError::ItemWriter(format!("Invalid UTF-8 in XML output: {}", e)))
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), BatchError> {
    writer
        .write_event(event)
        .map_err(|e| BatchError::ItemWriter(format!("Failed to write XML event: {}", e)))
}

fn write_line(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), BatchError> {
    write_event(writer, event)?;
    write_event(writer, Event::Text(BytesText::from_escaped("\n")))
}
