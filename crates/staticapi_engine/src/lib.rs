/* 📖 # What does staticapi_engine do?

It turns a data directory of JSON files into a route table, and the route table
into the two outputs: a live HttpService (api) and a static export (export). Both
consume the same RouteTable, so the live server and the exported API description
can never disagree about which routes exist.
*/

pub mod api;
pub mod config;
pub mod docs_page;
pub mod export;
pub mod metadata;
pub mod openapi;
pub mod route;
pub mod walker;

pub use api::ApiService;
pub use config::{CONFIG_FILE_NAME, Config, ServerConfig, load_config, load_config_or_default};
pub use docs_page::DocsPage;
pub use export::{CopiedCategory, CopyFailure, ExportReport, export_site};
pub use metadata::{DirectoryMetadata, METADATA_FILE_NAME, read_directory_metadata};
pub use openapi::{OpenApiDocument, build_openapi};
pub use route::{JsonResource, RouteDefinition, RouteTable};
pub use walker::{RouteScan, WalkError, derive_routes, route_path};
