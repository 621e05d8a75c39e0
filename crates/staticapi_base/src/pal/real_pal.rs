use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::{StaticApiError, StaticApiResult, error::ErrorKind};

use super::FilePath;
use super::http::{HttpServerConfig, HttpServerHandle, HttpService};
use super::traits::{DirectoryEntry, Pal, ReadSeek};

/// Concrete PAL implementation using the real filesystem via std::fs.
///
/// All file paths are resolved relative to a configured base directory,
/// ensuring operations stay within intended boundaries.
#[derive(Debug)]
pub struct RealPal {
    base_dir: PathBuf,
}

impl RealPal {
    /// Create a new RealPal with the given base directory.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Resolve a FilePath to an absolute filesystem path.
    fn resolve_path(&self, path: &FilePath) -> PathBuf {
        path.to_path(&self.base_dir)
    }
}

fn file_error(path: PathBuf, source: std::io::Error) -> Box<StaticApiError> {
    Box::new(StaticApiError::new(ErrorKind::FileError { path, source }))
}

impl Pal for RealPal {
    #[instrument(skip(self), fields(path = %path))]
    fn file_exists(&self, path: &FilePath) -> StaticApiResult<bool> {
        let resolved = self.resolve_path(path);
        let exists = resolved.exists();
        debug!(exists, resolved = %resolved.display(), "checked file existence");
        Ok(exists)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn is_directory(&self, path: &FilePath) -> StaticApiResult<bool> {
        Ok(self.resolve_path(path).is_dir())
    }

    /* 📖 # Why not follow symlinks when listing?
    A symlinked directory is reported as a file, so the tree walker never descends
    into it and cannot loop. Symlinked files still read through to their target.
    */
    #[instrument(skip(self), fields(path = %path))]
    fn list_directory(&self, path: &FilePath) -> StaticApiResult<Vec<DirectoryEntry>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "listing directory");

        let mut entries = Vec::new();
        for entry in WalkDir::new(&resolved)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| resolved.clone());
                file_error(path, std::io::Error::other(e.to_string()))
            })?;
            let name = entry.file_name().to_string_lossy();
            let child = path.join(name.as_ref());
            if entry.file_type().is_dir() {
                entries.push(DirectoryEntry::directory(child));
            } else {
                entries.push(DirectoryEntry::file(child));
            }
        }
        debug!(count = entries.len(), "directory listed");
        Ok(entries)
    }

    #[instrument(skip(self), fields(path = %path))]
    fn read_file(&self, path: &FilePath) -> StaticApiResult<Box<dyn ReadSeek + 'static>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "opening file for reading");
        let file = fs::File::open(&resolved).map_err(|e| {
            debug!(error = %e, "failed to open file");
            file_error(resolved, e)
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_file(&self, path: &FilePath) -> StaticApiResult<Box<dyn Write>> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating file");
        let file = fs::File::create(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create file");
            file_error(resolved, e)
        })?;
        Ok(Box::new(file))
    }

    #[instrument(skip(self), fields(path = %path))]
    fn create_directory_all(&self, path: &FilePath) -> StaticApiResult<()> {
        let resolved = self.resolve_path(path);
        debug!(resolved = %resolved.display(), "creating directory and parents");
        fs::create_dir_all(&resolved).map_err(|e| {
            debug!(error = %e, "failed to create directory");
            file_error(resolved, e)
        })?;
        Ok(())
    }

    #[instrument(skip(self, service), fields(address = %config.address()))]
    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> StaticApiResult<HttpServerHandle> {
        super::real_http::start_server(service, config)
    }
}
