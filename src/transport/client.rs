//! CNET transport adapter
//!
//! Owns one persistent connection to a CNET server and moves raw protocol
//! text across it. Inbound frames are delivered through a subscription
//! channel; outbound text is queued to the connection task.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};

use super::connection::{Connection, ConnectionError, ConnectionHandle};
use super::TransportConfig;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Not connected")]
    NotConnected,

    #[error("Connection timeout")]
    Timeout,
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Disconnected,
    Connecting,
    Connected,
}

/// Transport adapter for one CNET connection.
///
/// Lifecycle: [`open`](Transport::open) establishes the connection and
/// spawns the I/O task; [`send`](Transport::send) queues one frame;
/// [`subscribe`](Transport::subscribe) yields the inbound channel;
/// [`close`](Transport::close) signals end-of-session and tears down.
///
/// Sends issued while the transport is not open fail fast with
/// [`TransportError::NotConnected`]; nothing is queued for later.
pub struct Transport {
    /// Transport configuration
    config: TransportConfig,
    /// Current state
    state: Arc<RwLock<TransportState>>,
    /// Inbound subscription (replaced wholesale by subscribe)
    inbound_tx: Arc<RwLock<Option<mpsc::Sender<String>>>>,
    /// Connection handle for outbound text
    connection_handle: Arc<RwLock<Option<ConnectionHandle>>>,
    /// Shutdown signal
    shutdown_tx: Arc<RwLock<Option<mpsc::Sender<()>>>>,
}

impl Transport {
    /// Create a new transport (not yet connected)
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(TransportState::Disconnected)),
            inbound_tx: Arc::new(RwLock::new(None)),
            connection_handle: Arc::new(RwLock::new(None)),
            shutdown_tx: Arc::new(RwLock::new(None)),
        }
    }

    /// Open the connection to a server
    pub async fn open(&self, server_addr: SocketAddr) -> TransportResult<()> {
        {
            let state = self.state.read().await;
            if *state != TransportState::Disconnected {
                return Err(TransportError::AlreadyConnected);
            }
        }

        {
            let mut state = self.state.write().await;
            *state = TransportState::Connecting;
        }

        tracing::info!("Connecting to {}", server_addr);

        // Connect with timeout
        let stream = match tokio::time::timeout(
            Duration::from_millis(self.config.connect_timeout_ms),
            TcpStream::connect(server_addr),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                let mut state = self.state.write().await;
                *state = TransportState::Disconnected;
                return Err(TransportError::Io(e));
            }
            Err(_) => {
                let mut state = self.state.write().await;
                *state = TransportState::Disconnected;
                return Err(TransportError::Timeout);
            }
        };

        let mut conn = Connection::new(stream, server_addr, self.config.max_frame_size);

        // Create outbound channel
        let (msg_tx, mut msg_rx) = mpsc::channel::<String>(self.config.inbound_buffer);
        let handle = ConnectionHandle::new(msg_tx);

        {
            let mut ch = self.connection_handle.write().await;
            *ch = Some(handle.clone());
        }

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        {
            let mut st = self.shutdown_tx.write().await;
            *st = Some(shutdown_tx);
        }

        {
            let mut state = self.state.write().await;
            *state = TransportState::Connected;
        }

        tracing::info!("Connected to {}", server_addr);

        // Spawn the connection loop
        let state = self.state.clone();
        let inbound_tx = self.inbound_tx.clone();
        let connection_handle = self.connection_handle.clone();

        tokio::spawn(async move {
            let disconnect_reason = loop {
                tokio::select! {
                    // Receive frames from the server
                    result = conn.recv() => {
                        match result {
                            Ok(Some(text)) => {
                                tracing::debug!(len = text.len(), "Frame received");
                                let subscriber = inbound_tx.read().await.clone();
                                match subscriber {
                                    Some(tx) => {
                                        if tx.send(text).await.is_err() {
                                            tracing::debug!("Subscriber dropped, frame discarded");
                                        }
                                    }
                                    None => {
                                        tracing::debug!("No subscriber, frame discarded");
                                    }
                                }
                            }
                            Ok(None) => {
                                break "Connection closed by peer".to_string();
                            }
                            Err(e) => {
                                break format!("Receive error: {}", e);
                            }
                        }
                    }

                    // Send queued text to the server
                    Some(text) = msg_rx.recv() => {
                        if let Err(e) = conn.send(&text).await {
                            break format!("Send error: {}", e);
                        }
                        tracing::debug!(len = text.len(), "Frame sent");
                    }

                    // Shutdown: signal end-of-session with one empty frame
                    _ = shutdown_rx.recv() => {
                        let _ = conn.send("").await;
                        break "Transport closed".to_string();
                    }
                }
            };

            // Clean up
            handle.mark_disconnected();

            {
                let mut ch = connection_handle.write().await;
                *ch = None;
            }

            {
                let mut s = state.write().await;
                *s = TransportState::Disconnected;
            }

            let _ = conn.shutdown().await;

            tracing::info!("Disconnected: {}", disconnect_reason);
        });

        Ok(())
    }

    /// Open the connection to a server by hostname
    pub async fn open_hostname(&self, hostname: &str, port: u16) -> TransportResult<()> {
        let addr = super::resolve_host(hostname, port).await?;
        self.open(addr).await
    }

    /// Send exactly the given text as one frame
    pub async fn send(&self, text: &str) -> TransportResult<()> {
        let handle = self.connection_handle.read().await;
        match &*handle {
            Some(h) => h.send(text.to_string()).await.map_err(|e| match e {
                ConnectionError::Closed | ConnectionError::SendChannelClosed => {
                    TransportError::NotConnected
                }
                other => TransportError::Connection(other),
            }),
            None => Err(TransportError::NotConnected),
        }
    }

    /// Subscribe to inbound frames.
    ///
    /// Each inbound frame is delivered once, to the current subscriber.
    /// Subscribing again replaces the previous subscription; the old
    /// receiver sees its channel close. There is no fan-out.
    pub async fn subscribe(&self) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(self.config.inbound_buffer);
        let mut subscriber = self.inbound_tx.write().await;
        *subscriber = Some(tx);
        rx
    }

    /// Close the connection.
    ///
    /// Sends the empty end-of-session frame before tearing down. Idempotent:
    /// closing an already-closed transport is a no-op.
    pub async fn close(&self) -> TransportResult<()> {
        let tx = self.shutdown_tx.write().await.take();
        if let Some(tx) = tx {
            let _ = tx.send(()).await;
        }
        Ok(())
    }

    /// Get the current state
    pub async fn state(&self) -> TransportState {
        *self.state.read().await
    }

    /// Check if connected
    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == TransportState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    async fn read_frame(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let n = stream.read(&mut byte).await.unwrap();
            assert!(n > 0, "peer closed before frame terminator");
            buf.push(byte[0]);
            if buf.ends_with(b"\n\n") {
                buf.truncate(buf.len() - 2);
                return String::from_utf8(buf).unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_send_before_open_fails() {
        let transport = Transport::new(TransportConfig::default());
        let err = transport.send("OPERATION:ADD").await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn test_send_delivers_exact_text() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = Transport::new(TransportConfig::default());
        transport.open(addr).await.unwrap();
        assert!(transport.is_connected().await);

        let (mut server, _) = listener.accept().await.unwrap();

        let text = "OPERATION:ADD\nOPERAND1:3\nOPERAND2:4";
        transport.send(text).await.unwrap();
        assert_eq!(read_frame(&mut server).await, text);
    }

    #[tokio::test]
    async fn test_inbound_frame_reaches_subscriber_once() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = Transport::new(TransportConfig::default());
        let mut inbound = transport.subscribe().await;
        transport.open(addr).await.unwrap();

        let (mut server, _) = listener.accept().await.unwrap();
        server
            .write_all(b"RESULT:7\nSTATUS:OK\nMESSAGE:done\n\n")
            .await
            .unwrap();

        let frame = tokio::time::timeout(RECV_TIMEOUT, inbound.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame, "RESULT:7\nSTATUS:OK\nMESSAGE:done");

        // No second delivery
        let extra = tokio::time::timeout(Duration::from_millis(100), inbound.recv()).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn test_subscribe_replaces_previous_subscriber() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = Transport::new(TransportConfig::default());
        let mut first = transport.subscribe().await;
        let mut second = transport.subscribe().await;
        transport.open(addr).await.unwrap();

        let (mut server, _) = listener.accept().await.unwrap();
        server.write_all(b"RESULT:1\nSTATUS:OK\nMESSAGE:ok\n\n").await.unwrap();

        let frame = tokio::time::timeout(RECV_TIMEOUT, second.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame, "RESULT:1\nSTATUS:OK\nMESSAGE:ok");

        // The replaced subscription is dead, not silently starved.
        assert!(first.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_close_sends_empty_frame_and_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = Transport::new(TransportConfig::default());
        transport.open(addr).await.unwrap();

        let (mut server, _) = listener.accept().await.unwrap();

        transport.close().await.unwrap();
        assert_eq!(read_frame(&mut server).await, "");

        // Second close is a no-op
        transport.close().await.unwrap();

        // Sends after close are rejected once teardown completes
        let mut eof = [0u8; 1];
        assert_eq!(server.read(&mut eof).await.unwrap(), 0);
        let err = transport.send("OPERATION:ADD").await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn test_open_twice_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = Transport::new(TransportConfig::default());
        transport.open(addr).await.unwrap();
        let err = transport.open(addr).await.unwrap_err();
        assert!(matches!(err, TransportError::AlreadyConnected));
    }
}
