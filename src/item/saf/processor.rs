use log::debug;

use crate::{
    core::item::{ItemProcessor, ItemProcessorResult},
    item::csv::Row,
};

use super::item::{DEFAULT_DELIMITER, Item};

/// Turns a CSV row into an [`Item`], one column at a time.
pub struct RowItemProcessor {
    delimiter: String,
}

impl Default for RowItemProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl RowItemProcessor {
    /// `delimiter` separates multiple values inside one cell.
    pub fn new(delimiter: &str) -> Self {
        Self {
            delimiter: delimiter.to_string(),
        }
    }
}

impl ItemProcessor<Row, Item> for RowItemProcessor {
    fn process(&self, row: &Row) -> ItemProcessorResult<Item> {
        let item = row
            .iter()
            .fold(Item::builder().delimiter(&self.delimiter), |builder, (name, value)| {
                builder.set(name, value)
            })
            .build();

        debug!("Built item with {} metadata fields", item.attributes().len());
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> Row {
        cells
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn every_column_should_reach_the_item() {
        let processor = RowItemProcessor::default();

        let item = processor
            .process(&row(&[
                ("dc.title", "Hello||World"),
                ("dc.contributor.author[en]", "Jane Doe"),
                ("files", "./a.pdf"),
            ]))
            .unwrap();

        assert_eq!(item.attributes().len(), 2);
        assert_eq!(item.attribute("dc.title").unwrap(), "Hello||World");
        assert_eq!(item.files(), vec!["a.pdf"]);
        assert_eq!(item.delimiter(), "||");
    }

    #[test]
    fn configured_delimiter_should_be_used() {
        let processor = RowItemProcessor::new("|");

        let item = processor.process(&row(&[("dc.subject", "a|b")])).unwrap();

        assert!(item.to_xml("dc").unwrap().contains(">b</dcvalue>"));
    }
}
