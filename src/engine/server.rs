//! Preview server instances.
//!
//! Each instance serves one immutable [`RecordStore`] over HTTP:
//!
//! | Route                | Response                                   |
//! |----------------------|--------------------------------------------|
//! | `/`                  | HTML index with startup scripts inlined    |
//! | `/records.json`      | All records without their `text`           |
//! | `/records/<title>`   | One record (title percent-encoded)         |
//!
//! Lifecycle is explicit: [`PreviewInstance::start`] returns only once the
//! socket is listening, and [`PreviewInstance::stop`] returns only once the
//! socket is closed, so a successor can bind the same port.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{Receiver, bounded};
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server};

use super::store::RecordStore;

/// Attempts to bind the (possibly still closing) port before giving up.
const BIND_ATTEMPTS: u32 = 40;
const BIND_RETRY_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("failed to bind preview server on {addr}: {message}")]
    Bind { addr: SocketAddr, message: String },

    #[error("failed to spawn preview listener")]
    Spawn(#[source] io::Error),

    #[error("preview listener exited before it started listening")]
    ListenerDied,
}

/// A running preview listener.
pub struct PreviewInstance {
    server: Arc<Server>,
    addr: SocketAddr,
    stopped: Receiver<()>,
    handle: JoinHandle<()>,
}

impl PreviewInstance {
    /// Boot a listener for `store` and block until it is accepting requests.
    pub fn start(addr: SocketAddr, store: RecordStore) -> Result<Self, PreviewError> {
        let (ready_tx, ready_rx) = bounded::<Result<Arc<Server>, PreviewError>>(1);
        let (stopped_tx, stopped_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("preview".into())
            .spawn(move || {
                let server = match bind_with_retry(addr) {
                    Ok(server) => Arc::new(server),
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(Arc::clone(&server)));

                for request in server.incoming_requests() {
                    if let Err(e) = handle_request(request, &store) {
                        crate::debug!("preview"; "request error: {}", e);
                    }
                }

                drop(server);
                let _ = stopped_tx.send(());
            })
            .map_err(PreviewError::Spawn)?;

        let server = ready_rx.recv().map_err(|_| PreviewError::ListenerDied)??;
        crate::debug!("preview"; "listening on {}", addr);

        Ok(Self {
            server,
            addr,
            stopped: stopped_rx,
            handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting requests and wait until the listener has shut down.
    pub fn stop(self) {
        let Self {
            server,
            addr,
            stopped,
            handle,
        } = self;

        server.unblock();
        drop(server);

        // A dropped sender also means the thread is gone.
        let _ = stopped.recv();
        let _ = handle.join();
        crate::debug!("preview"; "stopped {}", addr);
    }
}

/// Bind `addr`, retrying while a previous instance releases the port.
fn bind_with_retry(addr: SocketAddr) -> Result<Server, PreviewError> {
    let mut last_error = String::new();
    for _ in 0..BIND_ATTEMPTS {
        match Server::http(addr) {
            Ok(server) => return Ok(server),
            Err(e) => {
                last_error = e.to_string();
                thread::sleep(BIND_RETRY_DELAY);
            }
        }
    }
    Err(PreviewError::Bind {
        addr,
        message: last_error,
    })
}

// ============================================================================
// Request handling
// ============================================================================

fn handle_request(request: Request, store: &RecordStore) -> io::Result<()> {
    if *request.method() != Method::Get && *request.method() != Method::Head {
        return respond(request, 405, "text/plain; charset=utf-8", "method not allowed".into());
    }

    let url = request.url().split('?').next().unwrap_or("/").to_string();
    match url.as_str() {
        "/" | "/index.html" => respond(request, 200, "text/html; charset=utf-8", render_index(store)),
        "/records.json" => {
            let skinny: Vec<_> = store.iter().map(|record| record.skinny()).collect();
            let body = serde_json::to_string(&skinny).map_err(io::Error::other)?;
            respond(request, 200, "application/json", body)
        }
        path => {
            let record = path
                .strip_prefix("/records/")
                .map(|encoded| percent_decode_str(encoded).decode_utf8_lossy().into_owned())
                .and_then(|title| store.get(&title));

            match record {
                Some(record) => {
                    let body = serde_json::to_string(record.as_ref()).map_err(io::Error::other)?;
                    respond(request, 200, "application/json", body)
                }
                None => respond(request, 404, "text/plain; charset=utf-8", "not found".into()),
            }
        }
    }
}

fn respond(request: Request, status: u16, content_type: &str, body: String) -> io::Result<()> {
    let mut response = Response::from_string(body).with_status_code(status);
    if let Ok(header) = Header::from_bytes("Content-Type", content_type) {
        response = response.with_header(header);
    }
    if let Ok(header) = Header::from_bytes("Cache-Control", "no-cache") {
        response = response.with_header(header);
    }
    request.respond(response)
}

/// Render the index page: a record listing plus inline startup scripts.
fn render_index(store: &RecordStore) -> String {
    let mut html = String::from(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>plugsmith preview</title></head><body>\n",
    );
    html.push_str(&format!("<h1>{} records</h1>\n<ul>\n", store.len()));

    for record in store.iter() {
        if let Some(title) = record.title() {
            let href = crate::utils::path::encode_title(title);
            html.push_str(&format!(
                "<li><a href=\"/records/{href}\">{}</a></li>\n",
                escape_html(title)
            ));
        }
    }
    html.push_str("</ul>\n");

    for script in store.startup_scripts() {
        let text = script.text().unwrap_or_default().replace("</script", "<\\/script");
        html.push_str("<script>");
        html.push_str(&text);
        html.push_str("</script>\n");
    }

    html.push_str("</body></html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
