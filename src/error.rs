use thiserror::Error;

#[derive(Error, Debug)]
/// Batch error
pub enum BatchError {
    #[error("ItemWriter from: {0}")]
    ItemWriter(String),

    /// Some items of a chunk were written, `failed` of them were not.
    #[error("ItemWriter failed on {failed} items: {message}")]
    PartialWrite { failed: usize, message: String },

    #[error("ItemReader from: {0}")]
    ItemReader(String),

    #[error("ItemProcessor from: {0}")]
    ItemProcessor(String),

    #[error("Step {0} failed")]
    Step(String),

    #[error("Attribute not found: {0}")]
    KeyNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
