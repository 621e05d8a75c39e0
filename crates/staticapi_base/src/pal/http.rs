/* 📖 # Why a dedicated HTTP module in the PAL?

The HTTP abstraction lets the engine serve requests while staying testable with
MockPal: services consume plain HttpRequest values and return HttpResponse values,
and only RealPal knows about sockets. Everything is synchronous.
*/

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use parking_lot::Mutex;

/// HTTP methods supported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl HttpMethod {
    /// Parse an HTTP method from a string.
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// Convert the method to its string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP headers collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    inner: HashMap<String, String>,
}

impl HttpHeaders {
    /// Create empty headers.
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// Insert a header.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    /// Get a header value. Header names are matched case-insensitively.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.inner.get(key).or_else(|| {
            self.inner
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)
        })
    }

    /// Check if a header exists.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over all headers.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.inner.iter()
    }
}

/// HTTP message body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpBody(Vec<u8>);

impl HttpBody {
    /// Create an empty body.
    pub fn empty() -> Self {
        Self(vec![])
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get content as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get content as a string if valid UTF-8.
    pub fn as_string(&self) -> Option<String> {
        String::from_utf8(self.0.clone()).ok()
    }

    /// Check if body is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the content length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Take ownership of the content.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for HttpBody {
    fn from(v: Vec<u8>) -> Self {
        Self::from_bytes(v)
    }
}

impl From<String> for HttpBody {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&str> for HttpBody {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// HTTP request structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: HttpMethod,
    path: String,
    headers: HttpHeaders,
    body: HttpBody,
}

impl HttpRequest {
    /// Create a new HTTP request. `path` may include a query string.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HttpHeaders::new(),
            body: HttpBody::empty(),
        }
    }

    /// Get the HTTP method.
    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    /// Get the request path, including any query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the request path without the query string.
    pub fn path_without_query(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }

    /// Get the request headers.
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Get the request body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Set the request body.
    pub fn with_body(mut self, body: impl Into<HttpBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }
}

/// HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatusCode {
    Ok = 200,
    NotFound = 404,
    MethodNotAllowed = 405,
    InternalServerError = 500,
    /// Unexpected service failure, see `HttpService::handle_request`.
    NetworkConnectTimeoutError = 599,
}

impl HttpStatusCode {
    /// Get the numeric status code.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// HTTP response structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: HttpStatusCode,
    headers: HttpHeaders,
    body: HttpBody,
}

impl HttpResponse {
    /// Create a new response with the given status.
    pub fn new(status: HttpStatusCode) -> Self {
        Self {
            status,
            headers: HttpHeaders::new(),
            body: HttpBody::empty(),
        }
    }

    /// Create a 200 OK response.
    pub fn ok() -> Self {
        Self::new(HttpStatusCode::Ok)
    }

    /// Create a 404 Not Found response with a plain text body.
    pub fn not_found() -> Self {
        Self::new(HttpStatusCode::NotFound)
            .with_content_type("text/plain")
            .with_body("Not found")
    }

    /// Create a 405 Method Not Allowed response.
    pub fn method_not_allowed() -> Self {
        Self::new(HttpStatusCode::MethodNotAllowed)
            .with_header("Allow", "GET")
            .with_content_type("text/plain")
            .with_body("Method not allowed")
    }

    /// Create a 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        Self::new(HttpStatusCode::InternalServerError)
    }

    /// Get the status code.
    pub fn status(&self) -> HttpStatusCode {
        self.status
    }

    /// Get the headers.
    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Get the body.
    pub fn body(&self) -> &HttpBody {
        &self.body
    }

    /// Take ownership of the body.
    pub fn into_body(self) -> HttpBody {
        self.body
    }

    /// Set the response body.
    pub fn with_body(mut self, body: impl Into<HttpBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Set the Content-Type header.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Create a JSON response.
    pub fn json(body: impl Into<HttpBody>) -> Self {
        Self::ok()
            .with_content_type("application/json")
            .with_body(body)
    }

    /// Create an HTML response.
    pub fn html(body: impl Into<String>) -> Self {
        Self::ok()
            .with_content_type("text/html; charset=utf-8")
            .with_body(body.into())
    }

    /// Create a plain text response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::ok()
            .with_content_type("text/plain")
            .with_body(body.into())
    }
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on. If None, the OS will assign an available port.
    pub port: Option<u16>,
    /// Server name used in responses.
    pub server_name: String,
}

impl HttpServerConfig {
    /// Create a new configuration with the given host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            server_name: "staticapi".to_string(),
        }
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the server name.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Get the address string (host:port, port 0 for OS-assigned).
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or(0))
    }
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self::new("127.0.0.1")
    }
}

/* 📖 # Why a single HttpService trait?

The service receives raw HttpRequest objects and returns HttpResponse objects,
giving the application full control over routing. The engine's ApiService is
the only implementation outside of tests.
*/

/// Trait for handling HTTP requests.
pub trait HttpService: std::fmt::Debug + Send + Sync + 'static {
    /// Handle an HTTP request and return a response.
    ///
    /// Expected outcomes (not found, failed loads) are regular responses. Errors
    /// returned as `Err` are unexpected; the real server turns them into HTTP 599
    /// so they stand out from deliberate status codes.
    fn handle_request(&self, request: HttpRequest) -> crate::StaticApiResult<HttpResponse>;
}

/// Sets the shutdown flag when the last handle clone goes away.
#[derive(Debug)]
struct ShutdownOnDrop(Arc<AtomicBool>);

impl Drop for ShutdownOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Handle to a running HTTP server.
#[derive(Debug, Clone)]
pub struct HttpServerHandle {
    port: u16,
    shutdown: Arc<AtomicBool>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
    _guard: Arc<ShutdownOnDrop>,
}

impl HttpServerHandle {
    /// Create a new handle for the given port.
    pub fn new(port: u16) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        Self {
            port,
            _guard: Arc::new(ShutdownOnDrop(Arc::clone(&shutdown))),
            shutdown,
            worker: Arc::new(Mutex::new(None)),
        }
    }

    /// Attach the thread running the accept loop, so `wait` can join it.
    pub fn with_worker(self, worker: JoinHandle<()>) -> Self {
        *self.worker.lock() = Some(worker);
        self
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the full address (host:port) the server is listening on.
    pub fn address(&self, host: &str) -> String {
        format!("{}:{}", host, self.port)
    }

    /// Signal the server to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Check if the server has been signaled to shut down.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Access the shutdown flag (for internal use by implementations).
    pub fn shutdown_flag(&self) -> &Arc<AtomicBool> {
        &self.shutdown
    }

    /// Block until the accept loop has exited. Returns immediately if there is none.
    pub fn wait(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                tracing::error!(port = self.port, "HTTP server thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_parse() {
        assert_eq!(HttpMethod::parse("GET"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("head"), Some(HttpMethod::Head));
        assert_eq!(HttpMethod::parse("INVALID"), None);
    }

    #[test]
    fn test_http_headers_case_insensitive() {
        let mut headers = HttpHeaders::new();
        headers.insert("Content-Type", "application/json");

        assert_eq!(
            headers.get("content-type"),
            Some(&"application/json".to_string())
        );
        assert!(headers.contains("CONTENT-TYPE"));
        assert!(!headers.contains("Accept"));
    }

    #[test]
    fn test_http_request_path_without_query() {
        let request = HttpRequest::new(HttpMethod::Get, "/kel/sample-id/data?pretty=1");
        assert_eq!(request.path(), "/kel/sample-id/data?pretty=1");
        assert_eq!(request.path_without_query(), "/kel/sample-id/data");
    }

    #[test]
    fn test_http_response_helpers() {
        let json = HttpResponse::json(r#"{"a":1}"#);
        assert_eq!(json.status(), HttpStatusCode::Ok);
        assert_eq!(
            json.headers().get("Content-Type"),
            Some(&"application/json".to_string())
        );

        let not_found = HttpResponse::not_found();
        assert_eq!(not_found.status().as_u16(), 404);
        assert_eq!(not_found.body().as_string(), Some("Not found".to_string()));

        let method = HttpResponse::method_not_allowed();
        assert_eq!(method.status().as_u16(), 405);
        assert_eq!(method.headers().get("Allow"), Some(&"GET".to_string()));
    }

    #[test]
    fn test_http_server_config() {
        let config = HttpServerConfig::new("0.0.0.0")
            .with_port(3000)
            .with_server_name("test-server");
        assert_eq!(config.address(), "0.0.0.0:3000");
        assert_eq!(config.server_name, "test-server");
        assert_eq!(HttpServerConfig::default().address(), "127.0.0.1:0");
    }

    #[test]
    fn test_http_server_handle_shutdown() {
        let handle = HttpServerHandle::new(8080);
        assert_eq!(handle.address("127.0.0.1"), "127.0.0.1:8080");
        assert!(!handle.is_shutdown());
        handle.shutdown();
        assert!(handle.is_shutdown());
    }

    #[test]
    fn test_dropping_clone_keeps_server_running() {
        let handle = HttpServerHandle::new(8080);
        let flag = Arc::clone(handle.shutdown_flag());
        let clone = handle.clone();
        drop(clone);
        assert!(!flag.load(Ordering::SeqCst));
        drop(handle);
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_wait_without_worker_returns() {
        let handle = HttpServerHandle::new(8080);
        handle.wait();
    }
}
