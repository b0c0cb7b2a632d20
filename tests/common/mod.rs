pub mod mocks;

use std::{fs, io, path::Path};

/// Writes `csv` as `metadata.csv` under `export_dir` along with the given
/// bitstream files, creating directories as needed.
pub fn write_export(export_dir: &Path, csv: &str, bitstreams: &[(&str, &str)]) -> io::Result<()> {
    fs::create_dir_all(export_dir)?;
    fs::write(export_dir.join("metadata.csv"), csv)?;

    for (path, content) in bitstreams {
        let path = export_dir.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
    }

    Ok(())
}
