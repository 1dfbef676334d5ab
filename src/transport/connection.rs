//! Connection handling
//!
//! Wraps one TCP stream with frame encoding/decoding and exposes a
//! cloneable handle for queueing outbound text.

use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use super::frame::{Decoder, Encoder, FrameError};

/// Connection errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Connection closed")]
    Closed,

    #[error("Send channel closed")]
    SendChannelClosed,
}

pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// One established connection to a CNET peer
pub struct Connection {
    /// Remote peer address
    remote_addr: SocketAddr,
    /// The TCP stream
    stream: TcpStream,
    /// Frame encoder
    encoder: Encoder,
    /// Frame decoder
    decoder: Decoder,
    /// Read buffer
    read_buf: BytesMut,
    /// Write buffer
    write_buf: BytesMut,
}

impl Connection {
    /// Create a new connection from an established TCP stream
    pub fn new(stream: TcpStream, remote_addr: SocketAddr, max_frame_size: usize) -> Self {
        Self {
            remote_addr,
            stream,
            encoder: Encoder::new(max_frame_size),
            decoder: Decoder::new(max_frame_size),
            read_buf: BytesMut::with_capacity(4096),
            write_buf: BytesMut::with_capacity(4096),
        }
    }

    /// Get the remote address
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Send one text payload as a single frame
    pub async fn send(&mut self, text: &str) -> ConnectionResult<()> {
        self.write_buf.clear();
        self.encoder.encode(text, &mut self.write_buf)?;

        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;

        Ok(())
    }

    /// Receive one frame payload (returns None on clean peer close)
    pub async fn recv(&mut self) -> ConnectionResult<Option<String>> {
        loop {
            if let Some(text) = self.decoder.decode(&mut self.read_buf)? {
                return Ok(Some(text));
            }

            let mut buf = [0u8; 4096];
            let n = self.stream.read(&mut buf).await?;

            if n == 0 {
                if self.read_buf.is_empty() {
                    return Ok(None); // Clean close
                } else {
                    return Err(ConnectionError::Closed);
                }
            }

            self.read_buf.extend_from_slice(&buf[..n]);
        }
    }

    /// Shut down the underlying stream
    pub async fn shutdown(&mut self) -> ConnectionResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// A handle for queueing outbound text on a connection
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    sender: mpsc::Sender<String>,
    connected: Arc<AtomicBool>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self {
            sender,
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Queue text for transmission on this connection
    pub async fn send(&self, text: String) -> Result<(), ConnectionError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ConnectionError::Closed);
        }

        self.sender
            .send(text)
            .await
            .map_err(|_| ConnectionError::SendChannelClosed)
    }

    /// Check if the connection is still active
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Mark the connection as disconnected
    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}
