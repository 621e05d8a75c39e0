/* 📖 # What does a static export contain?

Everything needed to host the API description without a server process:
- `openapi.json`, with `servers: [{url: "./"}]` so requests resolve relative to
  wherever the export is hosted
- `index.html`, the docs viewer loading `./openapi.json`, test requests hidden
- a copy of every category directory, so each route path plus `.json` is a real file

Writing the description and the page is all or nothing. Copying is done per
category: a category that fails to copy is reported and the others still are.
*/

use std::io::Write;

use tracing::{debug, info, instrument, warn};

use staticapi_base::error::ErrorKind;
use staticapi_base::{
    EntryKind, FilePath, PalHandle, ResultExt, StaticApiError, StaticApiResult,
};

use crate::config::Config;
use crate::docs_page::DocsPage;
use crate::openapi::build_openapi;
use crate::route::RouteTable;

pub const OPENAPI_FILE_NAME: &str = "openapi.json";
pub const INDEX_FILE_NAME: &str = "index.html";

/// Outcome of a static export.
#[derive(Debug)]
pub struct ExportReport {
    pub output_dir: FilePath,
    /// Generated files (API description and docs page).
    pub written: Vec<FilePath>,
    pub copied: Vec<CopiedCategory>,
    pub failures: Vec<CopyFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedCategory {
    pub category: String,
    pub files: usize,
}

/// A category that could not be copied (non-fatal).
#[derive(Debug)]
pub struct CopyFailure {
    pub category: String,
    pub error: Box<StaticApiError>,
}

/// Write the API description, the docs page and a copy of every category to the
/// configured output directory.
#[instrument(skip(pal, routes, config), fields(output_dir = %config.output_dir))]
pub fn export_site(
    pal: &PalHandle,
    routes: &RouteTable,
    config: &Config,
) -> StaticApiResult<ExportReport> {
    let output_dir = config.output_dir()?;
    pal.create_directory_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir))?;

    let openapi = build_openapi(routes, config.api_info())
        .with_server("./")
        .to_json_pretty()?;
    let openapi_path = output_dir.join(OPENAPI_FILE_NAME);
    write_file(pal, &openapi_path, openapi.as_bytes())?;

    let page = DocsPage::new(config.title.clone(), format!("./{}", OPENAPI_FILE_NAME))
        .with_hidden_test_requests()
        .render();
    let index_path = output_dir.join(INDEX_FILE_NAME);
    write_file(pal, &index_path, page.as_bytes())?;

    let data_root = config.data_root()?;
    let mut copied = Vec::new();
    let mut failures = Vec::new();
    for category in &config.categories {
        let source = data_root.join(category);
        match pal.is_directory(&source) {
            Ok(true) => {}
            Ok(false) => {
                debug!(%source, "category directory missing, not copied");
                continue;
            }
            Err(error) => {
                warn!(%source, %error, "failed to inspect category directory");
                failures.push(CopyFailure {
                    category: category.clone(),
                    error,
                });
                continue;
            }
        }

        match copy_tree(pal, &source, &output_dir.join(category)) {
            Ok(files) => {
                debug!(category = %category, files, "copied category");
                copied.push(CopiedCategory {
                    category: category.clone(),
                    files,
                });
            }
            Err(error) => {
                warn!(category = %category, %error, "failed to copy category");
                failures.push(CopyFailure {
                    category: category.clone(),
                    error,
                });
            }
        }
    }

    info!(
        routes = routes.len(),
        categories = copied.len(),
        failures = failures.len(),
        "export complete"
    );
    Ok(ExportReport {
        output_dir,
        written: vec![openapi_path, index_path],
        copied,
        failures,
    })
}

fn write_file(pal: &PalHandle, path: &FilePath, content: &[u8]) -> StaticApiResult<()> {
    let mut writer = pal.create_file(path)?;
    writer
        .write_all(content)
        .and_then(|()| writer.flush())
        .map_err(|source| {
            Box::new(StaticApiError::new(ErrorKind::FileError {
                path: path.as_path().to_path_buf(),
                source,
            }))
        })?;
    debug!(%path, bytes = content.len(), "wrote file");
    Ok(())
}

/// Recursively copy `source` to `target` through the PAL, returning the file count.
/// Symlinked directories are skipped, matching route derivation.
fn copy_tree(pal: &PalHandle, source: &FilePath, target: &FilePath) -> StaticApiResult<usize> {
    let mut files = 0;
    let mut stack = vec![(source.clone(), target.clone())];
    while let Some((from_dir, to_dir)) = stack.pop() {
        pal.create_directory_all(&to_dir)?;
        for entry in pal.list_directory(&from_dir)? {
            let to = to_dir.join(entry.name());
            match entry.kind {
                EntryKind::Directory => stack.push((entry.path, to)),
                EntryKind::File if pal.is_directory(&entry.path)? => {
                    // listings do not follow links, so a linked directory shows up as a file
                    debug!(path = %entry.path, "skipping symlinked directory");
                }
                EntryKind::File => {
                    let content = pal
                        .read_file_to_bytes(&entry.path)
                        .with_context(|| format!("Failed to copy {}", entry.path))?;
                    write_file(pal, &to, &content)?;
                    files += 1;
                }
            }
        }
    }
    Ok(files)
}
