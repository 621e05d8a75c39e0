use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use parking_lot::Mutex;

use crate::StaticApiError;
use crate::StaticApiResult;
use crate::error::ErrorKind;

use super::FilePath;
use super::http::{HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService};
use super::traits::{DirectoryEntry, EntryKind, Pal, ReadSeek};

/* 📖 # How does MockPal model directories?

Files live in a flat map keyed by normalized path. A directory exists if it was
added explicitly, created through `create_directory_all`, or is an ancestor of
any stored file. Listing derives the immediate children from those three sources,
so tests only need to add the files they care about.

Paths listed in `unreadable` make `list_directory` fail, which lets tests exercise
the non-fatal walk error path without touching file permissions.
*/

/// In-memory PAL implementation for testing.
///
/// # Examples
///
/// ```
/// use staticapi_base::{MockPal, Pal, FilePath};
///
/// let mock = MockPal::new();
/// mock.add_file("data/kel/x.json", r#"{"a":1}"#);
/// let content = mock.read_file_to_string(&FilePath::from("data/kel/x.json")).unwrap();
/// assert_eq!(content, r#"{"a":1}"#);
/// ```
#[derive(Debug, Clone)]
pub struct MockPal {
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    directories: Arc<Mutex<HashSet<FilePath>>>,
    unreadable: Arc<Mutex<HashSet<FilePath>>>,
    http_servers: Arc<Mutex<HashMap<u16, HttpServerInfo>>>,
    next_port: Arc<AtomicU16>,
}

/// Information about a registered HTTP server.
#[derive(Debug)]
struct HttpServerInfo {
    service: Box<dyn HttpService>,
    _config: HttpServerConfig,
}

fn not_found(path: &FilePath, what: &str) -> Box<StaticApiError> {
    Box::new(StaticApiError::new(ErrorKind::FileError {
        path: path.as_path().to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} not found: {}", what, path),
        ),
    }))
}

impl MockPal {
    /// Create a new empty MockPal.
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            directories: Arc::new(Mutex::new(HashSet::new())),
            unreadable: Arc::new(Mutex::new(HashSet::new())),
            http_servers: Arc::new(Mutex::new(HashMap::new())),
            next_port: Arc::new(AtomicU16::new(10000)),
        }
    }

    /// Add a file to the mock storage. Parent directories are implied.
    pub fn add_file(&self, path: impl Into<FilePath>, content: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .insert(path.into().normalize(), content.into());
    }

    /// Add an (empty) directory to the mock storage.
    pub fn add_directory(&self, path: impl Into<FilePath>) {
        self.directories.lock().insert(path.into().normalize());
    }

    /// Make `list_directory` fail for the given directory.
    pub fn set_unreadable(&self, path: impl Into<FilePath>) {
        self.unreadable.lock().insert(path.into().normalize());
    }

    /// Paths of all stored files, sorted.
    pub fn file_paths(&self) -> Vec<FilePath> {
        let mut paths: Vec<FilePath> = self.files.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Simulate an HTTP request to a running server.
    ///
    /// Looks up the service registered for `port` and invokes it directly, without
    /// any network I/O.
    pub fn simulate_request(
        &self,
        port: u16,
        request: HttpRequest,
    ) -> StaticApiResult<HttpResponse> {
        let servers = self.http_servers.lock();
        let server_info = servers
            .get(&port)
            .ok_or_else(|| crate::err!("No HTTP server registered on port {}", port))?;

        server_info.service.handle_request(request)
    }

    /// Get the number of registered HTTP servers.
    pub fn http_server_count(&self) -> usize {
        self.http_servers.lock().len()
    }

    fn directory_exists(&self, dir: &FilePath) -> bool {
        if dir.as_str().is_empty() || self.directories.lock().contains(dir) {
            return true;
        }
        let directories = self.directories.lock();
        let files = self.files.lock();
        directories
            .iter()
            .chain(files.keys())
            .any(|path| path != dir && path.strip_prefix(dir).is_some())
    }
}

impl Default for MockPal {
    fn default() -> Self {
        Self::new()
    }
}

impl Pal for MockPal {
    fn file_exists(&self, path: &FilePath) -> StaticApiResult<bool> {
        let path = path.normalize();
        let is_file = self.files.lock().contains_key(&path);
        Ok(is_file || self.directory_exists(&path))
    }

    fn is_directory(&self, path: &FilePath) -> StaticApiResult<bool> {
        let path = path.normalize();
        let is_file = self.files.lock().contains_key(&path);
        Ok(!is_file && self.directory_exists(&path))
    }

    fn list_directory(&self, path: &FilePath) -> StaticApiResult<Vec<DirectoryEntry>> {
        let dir = path.normalize();
        if self.unreadable.lock().contains(&dir) {
            return Err(Box::new(StaticApiError::new(ErrorKind::FileError {
                path: dir.as_path().to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    format!("Permission denied: {}", dir),
                ),
            })));
        }
        if !self.is_directory(&dir)? {
            return Err(not_found(&dir, "Directory"));
        }

        // child name -> kind, ordered for deterministic listings
        let mut children: BTreeMap<String, EntryKind> = BTreeMap::new();
        let mut record = |path: &FilePath, leaf_kind: EntryKind| {
            let Some(rest) = path.strip_prefix(&dir) else {
                return;
            };
            let mut components = rest.as_str().split('/').filter(|c| !c.is_empty());
            let Some(name) = components.next() else {
                return;
            };
            let kind = if components.next().is_some() {
                EntryKind::Directory
            } else {
                leaf_kind
            };
            children.entry(name.to_string()).or_insert(kind);
        };

        for file in self.files.lock().keys() {
            record(file, EntryKind::File);
        }
        for directory in self.directories.lock().iter() {
            record(directory, EntryKind::Directory);
        }

        Ok(children
            .into_iter()
            .map(|(name, kind)| DirectoryEntry {
                path: dir.join(name),
                kind,
            })
            .collect())
    }

    fn read_file(&self, path: &FilePath) -> StaticApiResult<Box<dyn ReadSeek + 'static>> {
        let files = self.files.lock();
        let content = files
            .get(&path.normalize())
            .ok_or_else(|| not_found(path, "File"))?
            .clone();
        Ok(Box::new(Cursor::new(content)))
    }

    fn create_file(&self, path: &FilePath) -> StaticApiResult<Box<dyn Write>> {
        Ok(Box::new(MockFileWriter {
            path: path.normalize(),
            files: Arc::clone(&self.files),
            buffer: Vec::new(),
        }))
    }

    fn create_directory_all(&self, path: &FilePath) -> StaticApiResult<()> {
        self.directories.lock().insert(path.normalize());
        Ok(())
    }

    fn start_http_server(
        &self,
        service: Box<dyn HttpService>,
        config: HttpServerConfig,
    ) -> StaticApiResult<HttpServerHandle> {
        let port = match config.port {
            Some(p) => p,
            None => self.next_port.fetch_add(1, Ordering::SeqCst),
        };

        let server_info = HttpServerInfo {
            service,
            _config: config,
        };
        self.http_servers.lock().insert(port, server_info);

        Ok(HttpServerHandle::new(port))
    }
}

/// Writer that stores its buffer in the MockPal when dropped.
struct MockFileWriter {
    path: FilePath,
    files: Arc<Mutex<HashMap<FilePath, Vec<u8>>>>,
    buffer: Vec<u8>,
}

impl Write for MockFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MockFileWriter {
    fn drop(&mut self) {
        self.files
            .lock()
            .insert(self.path.clone(), std::mem::take(&mut self.buffer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pal::http::{HttpMethod, HttpStatusCode};

    #[test]
    fn test_file_exists() {
        let pal = MockPal::new();
        pal.add_file("data/kel/x.json", "{}");

        assert!(pal.file_exists(&FilePath::from("data/kel/x.json")).unwrap());
        assert!(pal.file_exists(&FilePath::from("data/kel")).unwrap());
        assert!(!pal.file_exists(&FilePath::from("data/tel")).unwrap());
    }

    #[test]
    fn test_is_directory_implied_by_files() {
        let pal = MockPal::new();
        pal.add_file("data/kel/sample-id/data.json", "{}");

        assert!(pal.is_directory(&FilePath::from("data")).unwrap());
        assert!(pal.is_directory(&FilePath::from("data/kel/sample-id")).unwrap());
        assert!(!pal.is_directory(&FilePath::from("data/kel/sample-id/data.json")).unwrap());
        assert!(!pal.is_directory(&FilePath::from("data/ke")).unwrap());
    }

    #[test]
    fn test_read_file_not_found() {
        let pal = MockPal::new();
        let err = pal.read_file(&FilePath::from("missing.json")).err().unwrap();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_directory_immediate_children() {
        let pal = MockPal::new();
        pal.add_file("data/kel/a.json", "{}");
        pal.add_file("data/kel/nested/b.json", "{}");
        pal.add_file("data/kel/nested/c.json", "{}");
        pal.add_directory("data/kel/empty");
        pal.add_file("data/tel/t.json", "{}");

        let entries = pal.list_directory(&FilePath::from("data/kel")).unwrap();
        assert_eq!(
            entries,
            vec![
                DirectoryEntry::file("data/kel/a.json"),
                DirectoryEntry::directory("data/kel/empty"),
                DirectoryEntry::directory("data/kel/nested"),
            ]
        );
    }

    #[test]
    fn test_list_root_directory() {
        let pal = MockPal::new();
        pal.add_file("top.json", "{}");
        pal.add_file("data/kel/a.json", "{}");

        let entries = pal.list_directory(&FilePath::from("")).unwrap();
        assert_eq!(
            entries,
            vec![
                DirectoryEntry::directory("data"),
                DirectoryEntry::file("top.json"),
            ]
        );
    }

    #[test]
    fn test_list_directory_missing_or_unreadable() {
        let pal = MockPal::new();
        pal.add_file("data/kel/a.json", "{}");
        pal.set_unreadable("data/kel");

        let missing = pal.list_directory(&FilePath::from("data/tel")).err().unwrap();
        assert!(missing.is_not_found());
        let denied = pal.list_directory(&FilePath::from("data/kel")).err().unwrap();
        assert!(!denied.is_not_found());
    }

    #[test]
    fn test_create_file_stores_on_drop() {
        let pal = MockPal::new();
        pal.create_directory_all(&FilePath::from("pages/kel")).unwrap();

        let mut writer = pal.create_file(&FilePath::from("pages/kel/x.json")).unwrap();
        writer.write_all(b"{\"a\":1}").unwrap();
        drop(writer);

        let content = pal.read_file_to_string(&FilePath::from("pages/kel/x.json")).unwrap();
        assert_eq!(content, "{\"a\":1}");
        assert_eq!(pal.file_paths(), vec![FilePath::from("pages/kel/x.json")]);
    }

    #[derive(Debug)]
    struct PathService;

    impl HttpService for PathService {
        fn handle_request(&self, request: HttpRequest) -> StaticApiResult<HttpResponse> {
            match request.path() {
                "/kel/x" => Ok(HttpResponse::json(r#"{"a":1}"#)),
                _ => Ok(HttpResponse::not_found()),
            }
        }
    }

    #[test]
    fn test_start_http_server_auto_port() {
        let pal = MockPal::new();
        let first = pal
            .start_http_server(Box::new(PathService), HttpServerConfig::default())
            .unwrap();
        let second = pal
            .start_http_server(Box::new(PathService), HttpServerConfig::default())
            .unwrap();
        assert_eq!(first.port(), 10000);
        assert_eq!(second.port(), 10001);
        assert_eq!(pal.http_server_count(), 2);
    }

    #[test]
    fn test_simulate_request() {
        let pal = MockPal::new();
        let config = HttpServerConfig::new("127.0.0.1").with_port(3000);
        let handle = pal.start_http_server(Box::new(PathService), config).unwrap();
        assert_eq!(handle.port(), 3000);

        let ok = pal
            .simulate_request(3000, HttpRequest::new(HttpMethod::Get, "/kel/x"))
            .unwrap();
        assert_eq!(ok.status(), HttpStatusCode::Ok);
        assert_eq!(ok.body().as_string(), Some(r#"{"a":1}"#.to_string()));

        let missing = pal
            .simulate_request(3000, HttpRequest::new(HttpMethod::Get, "/kel/y"))
            .unwrap();
        assert_eq!(missing.status(), HttpStatusCode::NotFound);
    }

    #[test]
    fn test_simulate_request_unknown_port() {
        let pal = MockPal::new();
        let result = pal.simulate_request(9999, HttpRequest::new(HttpMethod::Get, "/"));
        assert!(result.is_err());
    }
}
