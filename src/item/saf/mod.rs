//! DSpace Simple Archive Format (SAF) support.
//!
//! - [`item`]: the archive item model and its builder
//! - [`qualified_name`]: `schema.element.qualifier[language]` decomposition
//! - [`dublin_core`]: per-schema Dublin Core XML serialization
//! - [`handles`]: document type to collection handle lookup
//! - [`processor`]: CSV row to item conversion
//! - [`saf_writer`]: item directories on disk

pub mod dublin_core;

pub mod handles;

pub mod item;

#[cfg(feature = "csv")]
pub mod processor;

pub mod qualified_name;

pub mod saf_writer;
