/* 📖 # Why is broken metadata silently ignored?

`metadata.json` is an optional annotation next to the data. A typo in it must not
take routes offline, so anything short of a well-formed object of the expected
shape behaves exactly as if the file were missing. The failure is still logged at
debug level so it can be tracked down with `RUST_LOG=debug`.
*/

use serde::Deserialize;
use tracing::debug;

use staticapi_base::{FilePath, PalHandle};

/// File name of the per-directory metadata file.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Optional annotations for the JSON files directly inside one directory.
///
/// Unknown keys are ignored. Metadata is not inherited by subdirectories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DirectoryMetadata {
    pub tags: Option<Vec<String>>,
    pub summary: Option<String>,
    pub description: Option<String>,
}

impl DirectoryMetadata {
    /// The tags to use, if any. An empty list counts as no tags.
    pub fn tags(&self) -> Option<&[String]> {
        self.tags.as_deref().filter(|tags| !tags.is_empty())
    }
}

/// Read `dir/metadata.json`, returning None if it is absent or not usable.
pub fn read_directory_metadata(pal: &PalHandle, dir: &FilePath) -> Option<DirectoryMetadata> {
    let path = dir.join(METADATA_FILE_NAME);
    match pal.file_exists(&path) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            debug!(%path, error = %e, "could not check for metadata");
            return None;
        }
    }

    let bytes = match pal.read_file_to_bytes(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(%path, error = %e, "ignoring unreadable metadata");
            return None;
        }
    };

    // Parse to a value first: serde would also accept a JSON array as a struct
    let value: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => {
            debug!(%path, error = %e, "ignoring metadata that is not valid JSON");
            return None;
        }
    };
    if !value.is_object() {
        debug!(%path, "ignoring metadata that is not a JSON object");
        return None;
    }

    match serde_json::from_value::<DirectoryMetadata>(value) {
        Ok(metadata) => {
            debug!(%path, ?metadata, "read directory metadata");
            Some(metadata)
        }
        Err(e) => {
            debug!(%path, error = %e, "ignoring metadata with unexpected shape");
            None
        }
    }
}
