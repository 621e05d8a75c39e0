/* 📖 # Why a single unified API service?

ApiService is the one HttpService the server runs. It dispatches internally on the
request path, in this order:
- `/swagger` -> documentation viewer page
- `/swagger/json` -> API description
- `/raw/{path}` -> file under the data root, served verbatim
- any derived route path -> the route's JSON file, re-read on every request
- anything else -> 404

A route table containing a path one of the first three would answer is refused
when the service is created, so no data file is silently unreachable.

Failures a client can cause (unknown path, missing raw file) and failures of a
single data file (unreadable, invalid JSON) are ordinary responses. Only a bug in
the service itself surfaces as `Err`, which the PAL turns into HTTP 599.
*/

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use staticapi_base::pal::http::{HttpMethod, HttpRequest, HttpResponse, HttpService};
use staticapi_base::{FilePath, PalHandle, StaticApiResult};

use crate::docs_page::DocsPage;
use crate::openapi::{Info, build_openapi};
use crate::route::{RouteDefinition, RouteTable};

pub const DOCS_PATH: &str = "/swagger";
pub const DOCS_JSON_PATH: &str = "/swagger/json";
pub const RAW_PREFIX: &str = "/raw/";

/// HTTP service exposing derived routes, the raw passthrough and the API docs.
#[derive(Clone)]
pub struct ApiService {
    pal: PalHandle,
    routes: Arc<RouteTable>,
    data_root: FilePath,
    openapi_json: Arc<String>,
    docs_html: Arc<String>,
}

impl ApiService {
    /// Create the service. The API description and docs page are rendered once here.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use staticapi_base::{FilePath, MockPal, PalHandle};
    /// use staticapi_engine::{ApiService, Config, RouteTable};
    ///
    /// let pal = PalHandle::new(MockPal::new());
    /// let config = Config::default();
    /// let service = ApiService::new(
    ///     pal,
    ///     Arc::new(RouteTable::default()),
    ///     FilePath::from("data"),
    ///     config.api_info(),
    /// )
    /// .unwrap();
    /// ```
    pub fn new(
        pal: PalHandle,
        routes: Arc<RouteTable>,
        data_root: FilePath,
        info: Info,
    ) -> StaticApiResult<Self> {
        if let Some(route) = routes.iter().find(|route| is_reserved_path(&route.path)) {
            staticapi_base::bail!(
                "Route '{}' (from {}) is shadowed by a built-in endpoint; rename its category",
                route.path,
                route.source
            );
        }
        let docs_html = DocsPage::new(info.title.clone(), DOCS_JSON_PATH).render();
        let openapi_json = build_openapi(&routes, info)
            .with_operation_tags()
            .with_raw_passthrough()
            .to_json()?;
        Ok(Self {
            pal,
            routes,
            data_root: data_root.normalize(),
            openapi_json: Arc::new(openapi_json),
            docs_html: Arc::new(docs_html),
        })
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    fn handle_route(&self, route: &RouteDefinition) -> StaticApiResult<HttpResponse> {
        match route.load() {
            Ok(value) => {
                let body = serde_json::to_vec(&value).map_err(|e| {
                    staticapi_base::err!("Failed to serialize {}: {}", route.source, e)
                })?;
                debug!(route = %route.path, bytes = body.len(), "served route");
                Ok(HttpResponse::json(body))
            }
            Err(e) => {
                warn!(route = %route.path, source = %route.source, error = %e, "failed to load route");
                Ok(HttpResponse::internal_error()
                    .with_content_type("text/plain")
                    .with_body(format!("Failed to load {}", route.path)))
            }
        }
    }

    fn handle_raw(&self, encoded: &str) -> StaticApiResult<HttpResponse> {
        let Some(relative) = decode_path(encoded) else {
            debug!(path = encoded, "raw path is not valid UTF-8");
            return Ok(HttpResponse::not_found());
        };
        let relative = relative.trim_start_matches('/');
        let relative_path = FilePath::from(relative);
        if relative.is_empty() || relative_path.has_parent_components() {
            debug!(path = relative, "rejected raw path");
            return Ok(HttpResponse::not_found());
        }

        let path = self.data_root.join(relative);
        if self.pal.is_directory(&path)? {
            return Ok(HttpResponse::not_found());
        }
        match self.pal.read_file_to_bytes(&path) {
            Ok(bytes) => Ok(HttpResponse::json(bytes)),
            Err(e) if e.is_not_found() => Ok(HttpResponse::not_found()),
            Err(e) => {
                warn!(%path, error = %e, "failed to read raw file");
                Ok(HttpResponse::internal_error()
                    .with_content_type("text/plain")
                    .with_body(format!("Failed to read {}", relative)))
            }
        }
    }
}

/// Paths answered before the route table is consulted.
fn is_reserved_path(path: &str) -> bool {
    path == DOCS_PATH || path == DOCS_JSON_PATH || path.starts_with(RAW_PREFIX)
}

fn decode_path(path: &str) -> Option<String> {
    percent_decode_str(path)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("routes", &self.routes.len())
            .field("data_root", &self.data_root)
            .finish()
    }
}

impl HttpService for ApiService {
    fn handle_request(&self, request: HttpRequest) -> StaticApiResult<HttpResponse> {
        if request.method() != &HttpMethod::Get {
            debug!(method = %request.method(), path = request.path(), "method not allowed");
            return Ok(HttpResponse::method_not_allowed());
        }

        let path = request.path_without_query();
        if path == DOCS_PATH {
            return Ok(HttpResponse::html(self.docs_html.as_str()));
        }
        if path == DOCS_JSON_PATH {
            return Ok(HttpResponse::json(self.openapi_json.as_str()));
        }
        if let Some(raw) = path.strip_prefix(RAW_PREFIX) {
            return self.handle_raw(raw);
        }

        let route = self.routes.get(path).or_else(|| {
            decode_path(path)
                .as_deref()
                .and_then(|decoded| self.routes.get(decoded))
        });
        match route {
            Some(route) => self.handle_route(route),
            None => {
                debug!(path, "no route");
                Ok(HttpResponse::not_found())
            }
        }
    }
}
