//! # Tasklet Module
//!
//! Single-task steps run after the item steps, such as packaging the
//! finished archive tree.

#[cfg(feature = "zip")]
#[cfg_attr(docsrs, doc(cfg(feature = "zip")))]
pub mod zip;
