//! Live preview supervisor.
//!
//! Each successful pass gets a fresh preview instance holding the base
//! wiki, the compiled plugins and the live-reload listener record. The
//! swap is two-phase on the same address:
//!
//! ```text
//! old.stop() ──(socket closed)──► PreviewInstance::start ──(listening)──► refresh
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use crate::embed::livereload_js;
use crate::engine::types::JAVASCRIPT;
use crate::engine::{PreviewError, PreviewInstance, RecordStore};
use crate::record::{MODULE_TYPE, Record, TEXT, TYPE};

/// Title of the injected live-reload listener record.
pub const LISTENER_TITLE: &str = "$:/plugsmith/livereload/listener";

/// Owns the running preview instance and replaces it pass after pass.
pub struct PreviewSupervisor {
    addr: SocketAddr,
    base: Vec<Arc<Record>>,
    listener: Arc<Record>,
    current: Option<PreviewInstance>,
}

impl PreviewSupervisor {
    /// `base` records are preloaded before the plugins in every instance.
    pub fn new(addr: SocketAddr, ws_port: u16, base: Vec<Record>) -> Self {
        Self {
            addr,
            base: base.into_iter().map(Arc::new).collect(),
            listener: Arc::new(listener_record(ws_port)),
            current: None,
        }
    }

    /// Replace the running instance with one serving `plugins`.
    ///
    /// Returns once the new instance accepts requests.
    pub fn swap(&mut self, plugins: &[Arc<Record>]) -> Result<(), PreviewError> {
        let store = self.store_for(plugins);

        if let Some(old) = self.current.take() {
            old.stop();
        }

        let instance = PreviewInstance::start(self.addr, store)?;
        crate::debug!("preview"; "serving {} plugins on http://{}", plugins.len(), instance.addr());
        self.current = Some(instance);
        Ok(())
    }

    /// Stop the running instance, if any.
    pub fn shutdown(&mut self) {
        if let Some(instance) = self.current.take() {
            instance.stop();
        }
    }

    fn store_for(&self, plugins: &[Arc<Record>]) -> RecordStore {
        let mut store = RecordStore::new();
        store.preload(self.base.iter().cloned());
        store.preload(plugins.iter().cloned());
        store.preload([Arc::clone(&self.listener)]);
        store
    }
}

impl Drop for PreviewSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The startup module that connects the page to the live-reload socket.
pub fn listener_record(ws_port: u16) -> Record {
    Record::new(LISTENER_TITLE)
        .with(TYPE, JAVASCRIPT)
        .with(MODULE_TYPE, "startup")
        .with(TEXT, livereload_js(ws_port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{Ipv4Addr, TcpListener, TcpStream};

    fn free_addr() -> SocketAddr {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        listener.local_addr().unwrap()
    }

    fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").unwrap();
        let mut body = String::new();
        stream.read_to_string(&mut body).unwrap();
        body
    }

    #[test]
    fn test_listener_record() {
        let record = listener_record(9123);
        assert_eq!(record.title(), Some(LISTENER_TITLE));
        assert_eq!(record.kind(), Some(JAVASCRIPT));
        assert_eq!(record.get(MODULE_TYPE), Some("startup"));
        assert!(record.text().unwrap().contains("9123"));
    }

    #[test]
    fn test_store_layering() {
        let base = vec![
            Record::new("$:/SiteTitle").with(TEXT, "Dev wiki"),
            Record::new("$:/plugins/me/foo").with(TEXT, "stale"),
        ];
        let supervisor = PreviewSupervisor::new(free_addr(), 8081, base);
        let plugin = Arc::new(Record::new("$:/plugins/me/foo").with(TEXT, "fresh"));

        let store = supervisor.store_for(&[plugin]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get("$:/plugins/me/foo").unwrap().text(), Some("fresh"));
        assert!(store.get(LISTENER_TITLE).is_some());
        assert_eq!(store.startup_scripts().count(), 1);
    }

    #[test]
    fn test_swap_reuses_address() {
        let addr = free_addr();
        let mut supervisor = PreviewSupervisor::new(addr, 8081, Vec::new());

        let first = Arc::new(Record::new("$:/plugins/me/first").with(TEXT, "{}"));
        supervisor.swap(&[first]).unwrap();
        assert!(get(addr, "/records.json").contains("$:/plugins/me/first"));

        let second = Arc::new(Record::new("$:/plugins/me/second").with(TEXT, "{}"));
        supervisor.swap(&[second]).unwrap();
        let listing = get(addr, "/records.json");
        assert!(listing.contains("$:/plugins/me/second"));
        assert!(!listing.contains("$:/plugins/me/first"));

        supervisor.shutdown();
        assert!(supervisor.current.is_none());
        assert!(TcpStream::connect(addr).is_err());
    }
}
