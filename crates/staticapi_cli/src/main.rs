/* 📖 # How does the CLI work?

Two subcommands over the same derivation pass:
- `staticapi serve` derives the routes and runs the live HTTP server until it is
  stopped
- `staticapi export` derives the routes and writes the static export

Both read `staticapi.toml` from the current directory when it exists (or the file
given with `--config`) and let flags override individual settings. All paths are
relative to the current directory, which is the base directory of the RealPal.

Exit codes:
- 0: Success
- 1: Error (invalid config, route collision, server or export failure)
*/

use std::env;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use staticapi_base::pal::http::HttpServerConfig;
use staticapi_base::tracing::init_tracing;
use staticapi_base::{FilePath, PalHandle, RealPal, StaticApiResult};
use staticapi_engine::api::DOCS_PATH;
use staticapi_engine::{
    ApiService, CONFIG_FILE_NAME, Config, RouteScan, derive_routes, export_site, load_config,
    load_config_or_default,
};
use tracing::info;

/// Serve a directory of JSON files as a documented read-only API
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file path (default: staticapi.toml, optional)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    config: Option<String>,

    /// Data root holding one directory per category
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    data_root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the live API server
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write the API description, docs page and data files for static hosting
    #[command(visible_alias = "e")]
    Export {
        /// Output directory
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        out_dir: Option<String>,
    },
}

impl Cli {
    /// Resolve the effective configuration: file values, then flag overrides.
    fn resolve_config(&self, pal: &PalHandle) -> StaticApiResult<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(pal, &FilePath::from(path.as_str()))?,
            None => load_config_or_default(pal, &FilePath::from(CONFIG_FILE_NAME))?,
        };
        if let Some(data_root) = &self.data_root {
            config.data_root = data_root.clone();
        }
        match &self.command {
            Commands::Serve { host, port } => {
                if let Some(host) = host {
                    config.server.host = host.clone();
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
            }
            Commands::Export { out_dir } => {
                if let Some(out_dir) = out_dir {
                    config.output_dir = out_dir.clone();
                }
            }
        }
        Ok(config)
    }
}

fn derive(pal: &PalHandle, config: &Config) -> StaticApiResult<RouteScan> {
    let scan = derive_routes(pal, config.categories.as_slice(), &config.data_root()?)?;
    if !scan.errors.is_empty() {
        eprintln!("\nWarnings during route derivation:");
        for error in &scan.errors {
            eprintln!("  - {}: {}", error.directory, error.error);
        }
    }
    println!("Derived {} routes", scan.routes.len());
    Ok(scan)
}

fn serve(pal: &PalHandle, config: &Config) -> StaticApiResult<()> {
    let scan = derive(pal, config)?;
    let service = ApiService::new(
        pal.clone(),
        Arc::new(scan.routes),
        config.data_root()?,
        config.api_info(),
    )?;
    let server_config =
        HttpServerConfig::new(config.server.host.clone()).with_port(config.server.port);
    let handle = pal.start_http_server(Box::new(service), server_config)?;

    let url = format!("http://{}", handle.address(&config.server.host));
    info!(%url, "server started");
    println!("Serving at {} (docs at {}{})", url, url, DOCS_PATH);
    handle.wait();
    Ok(())
}

fn export(pal: &PalHandle, config: &Config) -> StaticApiResult<()> {
    let scan = derive(pal, config)?;
    let report = export_site(pal, &scan.routes, config)?;

    for copied in &report.copied {
        println!("  + {} ({} files)", copied.category, copied.files);
    }
    if !report.failures.is_empty() {
        eprintln!("\nWarnings during export:");
        for failure in &report.failures {
            eprintln!("  - {}: {}", failure.category, failure.error);
        }
    }
    println!("Exported API description and docs to ./{}", report.output_dir);
    Ok(())
}

fn run(cli: &Cli) -> StaticApiResult<()> {
    let current_dir = env::current_dir()
        .map_err(|e| staticapi_base::err!("Failed to get current directory: {}", e))?;
    let pal = PalHandle::new(RealPal::new(current_dir));
    let config = cli.resolve_config(&pal)?;

    match cli.command {
        Commands::Serve { .. } => serve(&pal, &config),
        Commands::Export { .. } => export(&pal, &config),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_tracing() {
        eprintln!("Warning: {}", e);
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
