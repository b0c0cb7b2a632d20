use std::{collections::HashMap, fs::File, io::Read, path::Path};

use serde::Deserialize;

use crate::error::BatchError;

/// Handles of the target collections, keyed by `dc.type` value.
const DEFAULT_HANDLES: [(&str, &str); 20] = [
    ("article", "20.500.12034/6"),
    ("bachelorThesis", "20.500.12034/723"),
    ("book", "20.500.12034/4"),
    ("bookPart", "20.500.12034/586"),
    ("code", "20.500.12034/721"),
    ("conferenceObject", "20.500.12034/7"),
    ("courseMaterial", "20.500.12034/8"),
    ("doctoralThesis", "20.500.12034/724"),
    ("habilitationTreatise", "20.500.12034/725"),
    ("image", "20.500.12034_627"),
    ("masterThesis", "20.500.12034/10"),
    ("movingImage", "20.500.12034/626"),
    ("other", "20.500.12034/720"),
    ("preprint", "20.500.12034/718"),
    ("preregistration", "20.500.12034/736"),
    ("report", "20.500.12034/9"),
    ("researchData", "20.500.12034/576"),
    ("review", "20.500.12034/719"),
    ("sound", "20.500.12034/722"),
    ("test", "20.500.12034/12"),
];

/// Lookup table from a document type name to the handle of its collection.
///
/// The default table covers the repository's document types. A replacement
/// can be loaded from a flat JSON object:
///
/// ```
/// use dspace_csv_archive::item::saf::handles::HandleTable;
///
/// let json = r#"{ "article": "123456789/1", "dataset": "123456789/2" }"#;
/// let table = HandleTable::from_reader(json.as_bytes()).unwrap();
///
/// assert_eq!(table.resolve("dataset"), Some("123456789/2"));
/// assert_eq!(table.resolve("book"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct HandleTable {
    handles: HashMap<String, String>,
}

impl Default for HandleTable {
    fn default() -> Self {
        DEFAULT_HANDLES
            .iter()
            .map(|(name, handle)| (name.to_string(), handle.to_string()))
            .collect()
    }
}

impl FromIterator<(String, String)> for HandleTable {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            handles: iter.into_iter().collect(),
        }
    }
}

impl HandleTable {
    /// Loads a table from a JSON object of `"type": "handle"` pairs.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, BatchError> {
        serde_json::from_reader(rdr)
            .map_err(|error| BatchError::Configuration(format!("Invalid handle table: {}", error)))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BatchError> {
        let file = File::open(path.as_ref()).map_err(|error| {
            BatchError::Configuration(format!(
                "Cannot open handle table {}: {}",
                path.as_ref().display(),
                error
            ))
        })?;
        Self::from_reader(file)
    }

    /// Returns the handle registered for `type_name`, if any.
    pub fn resolve(&self, type_name: &str) -> Option<&str> {
        self.handles.get(type_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::HandleTable;
    use crate::error::BatchError;

    #[test]
    fn default_table_should_know_every_document_type() {
        let table = HandleTable::default();

        assert_eq!(table.len(), 20);
        assert_eq!(table.resolve("article"), Some("20.500.12034/6"));
        assert_eq!(table.resolve("doctoralThesis"), Some("20.500.12034/724"));
        assert_eq!(table.resolve("Article"), None);
    }

    #[test]
    fn non_string_values_should_be_rejected() {
        let result = HandleTable::from_reader(r#"{ "article": 6 }"#.as_bytes());

        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }

    #[test]
    fn missing_file_should_be_a_configuration_error() {
        let result = HandleTable::from_path("/nonexistent/handles.json");

        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }
}
