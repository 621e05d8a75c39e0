use std::collections::HashMap;

use staticapi_base::error::ErrorKind;
use staticapi_base::{FilePath, PalHandle, StaticApiError, StaticApiResult};

/// A JSON file that is read and parsed anew every time it is loaded.
#[derive(Debug, Clone)]
pub struct JsonResource {
    pal: PalHandle,
    path: FilePath,
}

impl JsonResource {
    pub fn new(pal: PalHandle, path: FilePath) -> Self {
        Self { pal, path }
    }

    pub fn path(&self) -> &FilePath {
        &self.path
    }

    /// Read and parse the file. Nothing is cached between calls.
    pub fn load(&self) -> StaticApiResult<serde_json::Value> {
        let bytes = self.pal.read_file_to_bytes(&self.path)?;
        serde_json::from_slice(&bytes).map_err(|source| {
            Box::new(StaticApiError::new(ErrorKind::InvalidJson {
                path: self.path.as_path().to_path_buf(),
                source,
            }))
        })
    }
}

/// One route, derived from one JSON file below a category directory.
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    /// Canonical route path, e.g. `/kel/sample-id/data`.
    pub path: String,
    /// Location of the JSON file backing this route.
    pub source: FilePath,
    /// Never empty.
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub resource: JsonResource,
}

impl RouteDefinition {
    /// Read the current contents of the backing file.
    pub fn load(&self) -> StaticApiResult<serde_json::Value> {
        self.resource.load()
    }
}

/// Immutable collection of routes, indexed by route path.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    /// Build a table, failing on the first route path that occurs twice.
    pub fn from_routes(routes: Vec<RouteDefinition>) -> StaticApiResult<Self> {
        let mut index = HashMap::with_capacity(routes.len());
        for (position, route) in routes.iter().enumerate() {
            if let Some(&existing) = index.get(&route.path) {
                let first: &RouteDefinition = &routes[existing];
                return Err(Box::new(StaticApiError::new(ErrorKind::DuplicateRoute {
                    route: route.path.clone(),
                    first: first.source.to_string(),
                    second: route.source.to_string(),
                })));
            }
            index.insert(route.path.clone(), position);
        }
        Ok(Self { routes, index })
    }

    pub fn get(&self, path: &str) -> Option<&RouteDefinition> {
        self.index.get(path).map(|&position| &self.routes[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// All route paths in lexicographic order.
    pub fn sorted_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.routes.iter().map(|r| r.path.as_str()).collect();
        paths.sort_unstable();
        paths
    }
}
