//! Mock readers and writers for step error scenarios.
use mockall::mock;

use dspace_csv_archive::{
    core::item::{ItemReader, ItemReaderResult, ItemWriter, ItemWriterResult},
    item::{csv::Row, saf::item::Item},
};

mock! {
    pub RowReader {}
    impl ItemReader<Row> for RowReader {
        fn read(&self) -> ItemReaderResult<Row>;
    }
}

mock! {
    pub ItemSink {}
    impl ItemWriter<Item> for ItemSink {
        fn write(&self, items: &[Item]) -> ItemWriterResult;
        fn flush(&self) -> ItemWriterResult;
        fn open(&self) -> ItemWriterResult;
        fn close(&self) -> ItemWriterResult;
    }
}
