//! `[serve]` section configuration.
//!
//! Settings for `plugsmith dev`.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"  # Network interface (127.0.0.1 = localhost only)
//! port = 8080              # Preview HTTP port, reused by every rebuild
//! ws_port = 8081           # First live-reload port to try
//! wiki = "wiki"            # Base wiki preloaded into the preview
//! settle_ms = 300          # Quiet period before a change triggers a rebuild
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the preview accessible from LAN.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// Preview HTTP port.
    pub port: u16,

    /// Live-reload socket port; later ports are tried if taken.
    pub ws_port: u16,

    /// Base wiki folder; its `tiddlers/` are preloaded.
    pub wiki: PathBuf,

    /// Watcher settling delay in milliseconds.
    pub settle_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            ws_port: 8081,
            wiki: "wiki".into(),
            settle_ms: 300,
        }
    }
}

impl ServeConfig {
    pub fn preview_addr(&self) -> SocketAddr {
        SocketAddr::new(self.interface, self.port)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port == 0 {
            diag.error("serve.port", "port must be fixed (the preview restarts on it)");
        }
        if self.port == self.ws_port {
            diag.error_with_hint(
                "serve.ws_port",
                format!("live-reload port {} collides with the preview port", self.ws_port),
                "pick a different ws_port",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use std::net::Ipv6Addr;

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.ws_port, 8081);
        assert_eq!(config.serve.settle(), Duration::from_millis(300));
    }

    #[test]
    fn test_serve_config_partial_override() {
        let config = test_parse_config("[serve]\nport = 3000\ninterface = \"::1\"");

        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.ws_port, 8081);
        assert_eq!(
            config.serve.preview_addr(),
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 3000)
        );
    }

    #[test]
    fn test_port_collision_reported() {
        let config = test_parse_config("[serve]\nport = 9000\nws_port = 9000");
        let mut diag = ConfigDiagnostics::new();
        config.serve.validate(&mut diag);
        assert_eq!(diag.errors().len(), 1);
        assert_eq!(diag.errors()[0].field, "serve.ws_port");
    }
}
