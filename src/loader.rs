use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::Error;

/// Read a JSON or YAML document, picking the parser by file extension.
pub fn load(path: impl AsRef<Path>) -> Result<Value, Error> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    let format = match extension.as_deref() {
        Some("json") => Format::Json,
        Some("yaml" | "yml") => Format::Yaml,
        _ => {
            return Err(Error::UnsupportedFormat {
                path: path.to_owned(),
            })
        }
    };

    let contents = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    tracing::debug!(path = %path.display(), ?format, "loaded document");

    match format {
        Format::Json => Ok(serde_json::from_str(&contents)?),
        Format::Yaml => Ok(serde_yaml::from_str(&contents)?),
    }
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Json,
    Yaml,
}
