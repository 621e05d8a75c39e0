use std::io::{Read, Seek, Write};
use std::sync::Arc;

use crate::StaticApiResult;
use crate::error::ErrorKind;

use super::file_path::FilePath;
use super::http::{HttpServerConfig, HttpServerHandle, HttpService};

/* 📖 # What is the Platform Abstraction Layer (PAL)?

The PAL is the storage provider for everything that touches the outside world:
listing directories, reading and writing files, and binding the HTTP server.
Route derivation, the live service and the exporter only ever talk to a
`PalHandle`, so all of them run unchanged against the in-memory MockPal in tests.
*/

/// Trait combining Read + Seek for file operations.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Kind of a directory entry as reported by `Pal::list_directory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Full path of the entry, relative to the PAL base directory.
    pub path: FilePath,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn file(path: impl Into<FilePath>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(path: impl Into<FilePath>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Final path component of the entry.
    pub fn name(&self) -> &str {
        self.path.file_name().unwrap_or_default()
    }
}

/// Platform Abstraction Layer (PAL) trait providing storage and server operations.
///
/// Two implementations are provided:
/// - `RealPal`: Uses the real filesystem and a tiny_http server
/// - `MockPal`: In-memory implementation for testing
pub trait Pal: std::fmt::Debug + Send + Sync + 'static {
    /// Check if a file or directory exists at the given path.
    fn file_exists(&self, path: &FilePath) -> StaticApiResult<bool>;

    /// Check if the given path exists and is a directory.
    fn is_directory(&self, path: &FilePath) -> StaticApiResult<bool>;

    /// List the immediate children of a directory.
    ///
    /// The order of the returned entries is unspecified.
    fn list_directory(&self, path: &FilePath) -> StaticApiResult<Vec<DirectoryEntry>>;

    /// Open a file for reading.
    fn read_file(&self, path: &FilePath) -> StaticApiResult<Box<dyn ReadSeek + 'static>>;

    /// Read entire file contents as bytes.
    fn read_file_to_bytes(&self, path: &FilePath) -> StaticApiResult<Vec<u8>> {
        let mut reader = self.read_file(path)?;
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).map_err(|e| {
            Box::new(crate::StaticApiError::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source: e,
            }))
        })?;
        Ok(contents)
    }

    /// Read entire file contents as a UTF-8 string.
    fn read_file_to_string(&self, path: &FilePath) -> StaticApiResult<String> {
        let contents = self.read_file_to_bytes(path)?;
        String::from_utf8(contents).map_err(|_e| crate::err!("File is not valid UTF-8: {}", path))
    }

    /// Create a new file, overwriting if it exists.
    fn create_file(&self, path: &FilePath) -> StaticApiResult<Box<dyn Write>>;

    /// Create a directory and all parent directories.
    fn create_directory_all(&self, path: &FilePath) -> StaticApiResult<()>;

    /// Start an HTTP server with the given service.
    ///
    /// Returns a handle to the running server. When the last clone of the handle is
    /// dropped (or shutdown() is called), the server stops accepting connections.
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> StaticApiResult<HttpServerHandle>;
}

/// Handle to a PAL implementation, enabling shared ownership.
///
/// Internally wraps `Arc<dyn Pal>` for cheap cloning and thread-safe sharing.
///
/// # Examples
///
/// ```no_run
/// use staticapi_base::{RealPal, PalHandle};
///
/// let pal = PalHandle::new(RealPal::new(".".into()));
/// let pal_clone = pal.clone(); // Cheap clone, shares the same implementation
/// ```
#[derive(Debug, Clone)]
pub struct PalHandle(Arc<dyn Pal>);

impl PalHandle {
    /// Create a new PalHandle from a Pal implementation.
    pub fn new(pal: impl Pal + 'static) -> Self {
        Self(Arc::new(pal))
    }
}

impl std::ops::Deref for PalHandle {
    type Target = dyn Pal;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_entry_name() {
        let entry = DirectoryEntry::file("data/kel/x.json");
        assert_eq!(entry.name(), "x.json");
        assert!(!entry.is_directory());

        let entry = DirectoryEntry::directory("data/kel");
        assert_eq!(entry.name(), "kel");
        assert!(entry.is_directory());
    }

    #[test]
    fn test_pal_handle_clone() {
        use crate::pal::mock::MockPal;
        let pal = PalHandle::new(MockPal::new());
        let _pal_clone = pal.clone();
    }
}
