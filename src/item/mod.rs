#[cfg(feature = "csv")]
/// This module provides a CSV item reader for metadata exports.
pub mod csv;

/// This module provides the Simple Archive Format item model, serializer and writer.
pub mod saf;
