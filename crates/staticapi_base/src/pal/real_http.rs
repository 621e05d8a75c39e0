use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, info, warn};

use crate::StaticApiResult;

use super::http::{
    HttpMethod, HttpRequest, HttpResponse, HttpServerConfig, HttpServerHandle, HttpService,
    HttpStatusCode,
};

/// How often the accept loop checks the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Bind a tiny_http server and run its accept loop on a background thread.
pub(crate) fn start_server(
    service: Box<dyn HttpService>,
    config: HttpServerConfig,
) -> StaticApiResult<HttpServerHandle> {
    let address = config.address();
    let server = Server::http(&address)
        .map_err(|e| crate::err!("Failed to bind HTTP server to {}: {}", address, e))?;
    let port = server
        .server_addr()
        .to_ip()
        .map(|addr| addr.port())
        .ok_or_else(|| crate::err!("HTTP server at {} is not bound to an IP address", address))?;

    let handle = HttpServerHandle::new(port);
    let shutdown = Arc::clone(handle.shutdown_flag());
    let service: Arc<dyn HttpService> = Arc::from(service);
    let server_name = config.server_name;
    let worker = std::thread::Builder::new()
        .name(format!("http-accept-{}", port))
        .spawn(move || accept_loop(server, service, shutdown, server_name))
        .map_err(|e| crate::err!("Failed to spawn HTTP server thread: {}", e))?;

    info!(host = %config.host, port, "HTTP server listening");
    Ok(handle.with_worker(worker))
}

/* 📖 # Why one thread per request?
Loaders do blocking reads. Handing each request to its own thread keeps a slow
file from holding up requests for other routes, and the service shares nothing
mutable between requests, so no coordination is needed.
*/
fn accept_loop(
    server: Server,
    service: Arc<dyn HttpService>,
    shutdown: Arc<AtomicBool>,
    server_name: String,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => {
                let service = Arc::clone(&service);
                let server_name = server_name.clone();
                let spawned = std::thread::Builder::new()
                    .name("http-request".to_string())
                    .spawn(move || respond(request, service.as_ref(), &server_name));
                if let Err(e) = spawned {
                    warn!(error = %e, "failed to spawn request thread");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to receive HTTP request"),
        }
    }
    debug!("HTTP accept loop stopped");
}

fn respond(mut request: Request, service: &dyn HttpService, server_name: &str) {
    let method = request.method().as_str().to_string();
    let url = request.url().to_string();

    let response = match HttpMethod::parse(&method) {
        Some(http_method) => {
            let mut http_request = HttpRequest::new(http_method, url.clone());
            for header in request.headers() {
                http_request = http_request.with_header(
                    header.field.as_str().as_str().to_string(),
                    header.value.as_str().to_string(),
                );
            }
            let mut body = Vec::new();
            if let Err(e) = request.as_reader().read_to_end(&mut body) {
                warn!(%url, error = %e, "failed to read request body");
            }
            match service.handle_request(http_request.with_body(body)) {
                Ok(response) => response,
                Err(e) => {
                    warn!(%method, %url, error = %e, "service failed to handle request");
                    HttpResponse::new(HttpStatusCode::NetworkConnectTimeoutError)
                        .with_content_type("text/plain")
                        .with_body(e.to_string())
                }
            }
        }
        None => HttpResponse::method_not_allowed(),
    };

    let status = response.status().as_u16();
    debug!(%method, %url, status, "responding");

    let mut headers = Vec::new();
    for (name, value) in response.headers().iter() {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => headers.push(header),
            Err(()) => warn!(%name, "dropping invalid response header"),
        }
    }
    if let Ok(header) = Header::from_bytes(&b"Server"[..], server_name.as_bytes()) {
        headers.push(header);
    }

    let mut reply = Response::from_data(response.into_body().into_bytes()).with_status_code(status);
    for header in headers {
        reply.add_header(header);
    }
    if let Err(e) = request.respond(reply) {
        warn!(%url, error = %e, "failed to send response");
    }
}
