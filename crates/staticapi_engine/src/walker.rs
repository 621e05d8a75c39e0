/* 📖 # Why collect walk errors instead of failing?

Derivation follows the same fail-tolerant approach as the rest of the engine: a
directory that cannot be listed is recorded as a WalkError and the walk moves on,
so one unreadable subtree never hides the routes of all the others. The only
fatal outcome is a route path collision, because serving either file would
silently shadow the other. An absolute data root is rejected up front, since it
cannot be addressed through the PAL and would otherwise look like an empty tree.
*/

use tracing::{debug, info, instrument, warn};

use staticapi_base::{EntryKind, FilePath, PalHandle, StaticApiError, StaticApiResult};

use crate::metadata::read_directory_metadata;
use crate::route::{JsonResource, RouteDefinition, RouteTable};

const JSON_EXTENSION: &str = ".json";

/// Result of a derivation pass: the routes plus any non-fatal errors.
#[derive(Debug)]
pub struct RouteScan {
    pub routes: RouteTable,
    pub errors: Vec<WalkError>,
}

/// A directory that could not be listed during derivation.
#[derive(Debug)]
pub struct WalkError {
    pub directory: FilePath,
    pub error: Box<StaticApiError>,
}

/// Walk every category below `data_root` and derive one route per JSON file.
///
/// Missing categories are skipped. Traversal order is unspecified.
///
/// # Examples
/// ```
/// use staticapi_base::{FilePath, MockPal, PalHandle};
/// use staticapi_engine::derive_routes;
///
/// let mock = MockPal::new();
/// mock.add_file("data/kel/sample-id/data.json", r#"{"a":1}"#);
/// let pal = PalHandle::new(mock);
///
/// let scan = derive_routes(&pal, &["kel", "ksn"], &FilePath::from("data")).unwrap();
/// let route = scan.routes.get("/kel/sample-id/data").unwrap();
/// assert_eq!(route.tags, vec!["KEL"]);
/// ```
#[instrument(skip(pal, categories), fields(data_root = %data_root))]
pub fn derive_routes<S: AsRef<str>>(
    pal: &PalHandle,
    categories: &[S],
    data_root: &FilePath,
) -> StaticApiResult<RouteScan> {
    if data_root.is_absolute() {
        staticapi_base::bail!(
            "Data root must be relative to the storage base, got '{}'",
            data_root
        );
    }
    let data_root = data_root.normalize();
    let mut routes = Vec::new();
    let mut errors = Vec::new();

    for category in categories {
        let category = category.as_ref();
        let category_dir = data_root.join(category);
        match pal.is_directory(&category_dir) {
            Ok(true) => {}
            Ok(false) => {
                debug!(%category_dir, "category directory missing, skipping");
                continue;
            }
            Err(e) => {
                debug!(%category_dir, error = %e, "category directory not accessible, skipping");
                continue;
            }
        }

        let default_tag = category.to_uppercase();
        let mut stack = vec![category_dir];
        while let Some(dir) = stack.pop() {
            let entries = match pal.list_directory(&dir) {
                Ok(entries) => entries,
                Err(error) => {
                    warn!(directory = %dir, %error, "failed to list directory");
                    errors.push(WalkError {
                        directory: dir,
                        error,
                    });
                    continue;
                }
            };
            let metadata = read_directory_metadata(pal, &dir);

            for entry in entries {
                if entry.kind == EntryKind::Directory {
                    stack.push(entry.path);
                    continue;
                }
                if !entry.name().ends_with(JSON_EXTENSION) {
                    continue;
                }
                let Some(route_path) = route_path(&entry.path, &data_root) else {
                    continue;
                };

                let tags = metadata
                    .as_ref()
                    .and_then(|m| m.tags())
                    .map(<[String]>::to_vec)
                    .unwrap_or_else(|| vec![default_tag.clone()]);
                debug!(route = %route_path, source = %entry.path, "derived route");
                routes.push(RouteDefinition {
                    path: route_path,
                    tags,
                    summary: metadata.as_ref().and_then(|m| m.summary.clone()),
                    description: metadata.as_ref().and_then(|m| m.description.clone()),
                    resource: JsonResource::new(pal.clone(), entry.path.clone()),
                    source: entry.path,
                });
            }
        }
    }

    let routes = RouteTable::from_routes(routes)?;
    info!(
        routes = routes.len(),
        errors = errors.len(),
        "route derivation complete"
    );
    Ok(RouteScan { routes, errors })
}

/// Map a JSON file to its route path: relative to the data root, `.json` removed,
/// one leading slash.
pub fn route_path(file: &FilePath, data_root: &FilePath) -> Option<String> {
    let relative = file.strip_prefix(data_root)?;
    let stem = relative.as_str().strip_suffix(JSON_EXTENSION)?;
    Some(format!("/{}", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use staticapi_base::MockPal;
    use staticapi_base::error::ErrorKind;

    const CATEGORIES: [&str; 3] = ["kel", "ksn", "tel"];

    fn scan(mock: &MockPal) -> RouteScan {
        derive_routes(
            &PalHandle::new(mock.clone()),
            &CATEGORIES,
            &FilePath::from("data"),
        )
        .unwrap()
    }

    #[test]
    fn test_route_path() {
        let root = FilePath::from("data");
        assert_eq!(
            route_path(&FilePath::from("data/kel/abc/data.json"), &root),
            Some("/kel/abc/data".to_string())
        );
        assert_eq!(
            route_path(&FilePath::from("data/category/a/b/file.json"), &root),
            Some("/category/a/b/file".to_string())
        );
        assert_eq!(route_path(&FilePath::from("data/kel/x.txt"), &root), None);
        assert_eq!(route_path(&FilePath::from("other/kel/x.json"), &root), None);
    }

    #[test]
    fn test_single_file_scenario() {
        let mock = MockPal::new();
        mock.add_file("data/kel/sample-id/data.json", r#"{"a":1}"#);

        let scan = scan(&mock);
        assert!(scan.errors.is_empty());
        assert_eq!(scan.routes.sorted_paths(), vec!["/kel/sample-id/data"]);

        let route = scan.routes.get("/kel/sample-id/data").unwrap();
        assert_eq!(route.tags, vec!["KEL"]);
        assert_eq!(route.summary, None);
        assert_eq!(route.description, None);
        assert_eq!(route.source, FilePath::from("data/kel/sample-id/data.json"));
        assert_eq!(route.load().unwrap(), serde_json::json!({"a": 1}));
    }

    #[test]
    fn test_non_json_files_ignored() {
        let mock = MockPal::new();
        mock.add_file("data/kel/a.json", "{}");
        mock.add_file("data/kel/notes.txt", "hello");
        mock.add_file("data/kel/upper.JSON", "{}");
        mock.add_file("data/kel/.json.bak", "{}");

        assert_eq!(scan(&mock).routes.sorted_paths(), vec!["/kel/a"]);
    }

    #[test]
    fn test_metadata_applies_to_its_directory_only() {
        let mock = MockPal::new();
        mock.add_file(
            "data/tel/registry/metadata.json",
            r#"{"tags":["X"],"summary":"S","description":"D"}"#,
        );
        mock.add_file("data/tel/registry/a.json", "{}");
        mock.add_file("data/tel/registry/b.json", "{}");
        mock.add_file("data/tel/registry/nested/c.json", "{}");

        let scan = scan(&mock);
        for path in ["/tel/registry/a", "/tel/registry/b", "/tel/registry/metadata"] {
            let route = scan.routes.get(path).unwrap();
            assert_eq!(route.tags, vec!["X"]);
            assert_eq!(route.summary.as_deref(), Some("S"));
            assert_eq!(route.description.as_deref(), Some("D"));
        }

        let nested = scan.routes.get("/tel/registry/nested/c").unwrap();
        assert_eq!(nested.tags, vec!["TEL"]);
        assert_eq!(nested.summary, None);
    }

    #[test]
    fn test_invalid_metadata_behaves_like_none() {
        let with_invalid = MockPal::new();
        with_invalid.add_file("data/ksn/metadata.json", "{broken");
        with_invalid.add_file("data/ksn/a.json", "{}");

        let route = scan(&with_invalid).routes.get("/ksn/a").unwrap().clone();
        assert_eq!(route.tags, vec!["KSN"]);
        assert_eq!(route.summary, None);
        assert_eq!(route.description, None);
    }

    #[test]
    fn test_same_name_in_different_categories() {
        let mock = MockPal::new();
        mock.add_file("data/kel/x.json", "{}");
        mock.add_file("data/tel/x.json", "{}");

        let scan = scan(&mock);
        assert_eq!(scan.routes.sorted_paths(), vec!["/kel/x", "/tel/x"]);
        assert_eq!(scan.routes.get("/kel/x").unwrap().tags, vec!["KEL"]);
        assert_eq!(scan.routes.get("/tel/x").unwrap().tags, vec!["TEL"]);
    }

    #[test]
    fn test_missing_categories_skipped() {
        let mock = MockPal::new();
        mock.add_file("data/other/x.json", "{}");

        let scan = scan(&mock);
        assert!(scan.routes.is_empty());
        assert!(scan.errors.is_empty());
    }

    #[test]
    fn test_derivation_is_repeatable() {
        let mock = MockPal::new();
        mock.add_file("data/kel/a/b/c.json", "{}");
        mock.add_file("data/kel/a/d.json", "{}");
        mock.add_file("data/tel/e.json", "{}");

        assert_eq!(
            scan(&mock).routes.sorted_paths(),
            scan(&mock).routes.sorted_paths()
        );
    }

    #[test]
    fn test_unreadable_directory_is_not_fatal() {
        let mock = MockPal::new();
        mock.add_file("data/kel/ok/a.json", "{}");
        mock.add_file("data/kel/locked/b.json", "{}");
        mock.set_unreadable("data/kel/locked");

        let scan = scan(&mock);
        assert_eq!(scan.routes.sorted_paths(), vec!["/kel/ok/a"]);
        assert_eq!(scan.errors.len(), 1);
        assert_eq!(scan.errors[0].directory, FilePath::from("data/kel/locked"));
    }

    #[test]
    fn test_duplicate_category_is_fatal() {
        let mock = MockPal::new();
        mock.add_file("data/kel/x.json", "{}");

        let err = derive_routes(
            &PalHandle::new(mock),
            &["kel", "kel"],
            &FilePath::from("data"),
        )
        .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::DuplicateRoute { route, .. } if route == "/kel/x"));
    }

    #[test]
    fn test_data_root_at_base() {
        let mock = MockPal::new();
        mock.add_file("kel/x.json", "{}");

        let scan = derive_routes(&PalHandle::new(mock), &["kel"], &FilePath::from(".")).unwrap();
        assert_eq!(scan.routes.sorted_paths(), vec!["/kel/x"]);
    }

    #[test]
    fn test_absolute_data_root_is_rejected() {
        let mock = MockPal::new();
        mock.add_file("srv/data/kel/sample-id/data.json", "{}");

        let err = derive_routes(
            &PalHandle::new(mock),
            &["kel", "ksn", "tel"],
            &FilePath::from("/srv/data"),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Data root must be relative to the storage base, got '/srv/data'"
        );
    }
}
