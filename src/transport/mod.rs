//! Transport module - Moves opaque protocol text over TCP
//!
//! Provides:
//! - Frame encoding/decoding for message boundaries
//! - A connection wrapper around the TCP stream
//! - The transport adapter with its lifecycle (open, send, subscribe, close)
//!
//! The transport has no protocol awareness: it carries whatever text the
//! caller hands it and delivers whatever text the peer sends, unmodified.

mod client;
mod connection;
mod frame;

pub use client::*;
pub use connection::*;
pub use frame::*;

use std::net::SocketAddr;

/// Configuration for transport operations
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Maximum frame payload size in bytes
    pub max_frame_size: usize,
    /// Capacity of the inbound subscription channel
    pub inbound_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5000,
            max_frame_size: 64 * 1024,
            inbound_buffer: 64,
        }
    }
}

/// Resolve a hostname to a socket address
pub async fn resolve_host(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    use tokio::net::lookup_host;

    let addr_string = format!("{}:{}", host, port);
    let mut addrs = lookup_host(&addr_string).await?;

    addrs.next().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Could not resolve host: {}", host),
        )
    })
}
