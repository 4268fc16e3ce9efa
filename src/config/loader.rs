//! Configuration file loading from disk.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::error::ConfigError;
use super::schema::OptionLayer;

/// Load one option layer from a TOML config file.
///
/// Returns `Ok(None)` when the file does not exist; the caller decides
/// whether that deserves a warning. Unknown keys are ignored. Any other
/// read or parse failure is fatal.
pub fn load_file(path: &Path) -> Result<Option<OptionLayer>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let layer = toml::from_str(&content).map_err(|source| ConfigError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(layer))
}
