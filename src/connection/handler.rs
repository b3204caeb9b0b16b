//! Connection Handler Module
//!
//! This module handles individual client connections.
//! Each client gets its own handler task that runs in a loop,
//! reading requests and sending replies.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. "Successful connection" greeting
//!        │
//!        ▼
//! 3. Password challenge (only when a password is configured)
//!        │
//!        ▼
//! 4. ┌──────────────────────────────┐
//!    │      Main Loop               │
//!    │                              │
//!    │  Read bytes from socket      │
//!    │  Frame + tokenize a line     │
//!    │  QUIT / EXIT? ──> stop       │
//!    │  Execute request             │
//!    │  Send reply line             │
//!    │         [Loop back]          │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 5. Client disconnects / QUIT / error
//! ```
//!
//! ## Buffer Management
//!
//! Incoming bytes accumulate in a `BytesMut`. TCP is a stream, so one read
//! may hold half a request or several of them; requests are cut from the
//! front of the buffer as soon as they are complete.

use crate::commands::CommandHandler;
use crate::protocol::{parse_request, Reply};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// Maximum size for the read buffer (64 KB)
const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Sent to every client right after accept.
pub const GREETING: &str = "Successful connection\n";

/// Sent when the server requires a password.
pub const AUTH_PROMPT: &str = "Authorize to proceed\n";

/// Sent after a correct password.
pub const AUTH_OK: &str = "You have authorized successfully\n";

/// Sent after a wrong password.
pub const AUTH_FAILED: &str = "Incorrect attempt of authorization\n";

/// Statistics for connection handling
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total requests executed
    pub commands_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Logs a one-line summary of the counters.
    pub fn log_summary(&self) {
        info!(
            accepted = self.connections_accepted.load(Ordering::Relaxed),
            active = self.active_connections.load(Ordering::Relaxed),
            commands = self.commands_processed.load(Ordering::Relaxed),
            bytes_in = self.bytes_read.load(Ordering::Relaxed),
            bytes_out = self.bytes_written.load(Ordering::Relaxed),
            "Connection statistics"
        );
    }
}

/// Handles a single client connection.
pub struct ConnectionHandler {
    /// The TCP stream for this connection
    stream: BufWriter<TcpStream>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// The command handler (shared across connections)
    command_handler: CommandHandler,

    /// Password the client must send first, if any
    password: Option<String>,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,
}

impl ConnectionHandler {
    /// Creates a new connection handler.
    ///
    /// # Arguments
    ///
    /// * `stream` - The TCP stream for this connection
    /// * `addr` - The client's socket address
    /// * `command_handler` - The command handler for executing requests
    /// * `password` - Password required before any request, if any
    /// * `stats` - Shared connection statistics
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        command_handler: CommandHandler,
        password: Option<String>,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            command_handler,
            password,
            stats,
        }
    }

    /// Runs the connection until the client quits, disconnects, or fails.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.session().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client disconnected gracefully"),
            Err(e) => match e {
                ConnectionError::ClientDisconnected => {
                    debug!(client = %self.addr, "Client disconnected")
                }
                ConnectionError::IoError(io_err)
                    if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.addr, "Connection reset by client")
                }
                _ => warn!(client = %self.addr, error = %e, "Connection error"),
            },
        }

        self.stats.connection_closed();
        result
    }

    async fn session(&mut self) -> Result<(), ConnectionError> {
        self.send_raw(GREETING.as_bytes()).await?;

        if let Some(password) = self.password.clone() {
            self.authorize(&password).await?;
        }

        self.main_loop().await
    }

    /// Repeats the password challenge until the client gets it right.
    async fn authorize(&mut self, password: &str) -> Result<(), ConnectionError> {
        self.send_raw(AUTH_PROMPT.as_bytes()).await?;

        loop {
            let line = self.next_line().await?;

            if line.trim() == password {
                debug!(client = %self.addr, "Client authorized");
                self.send_raw(AUTH_OK.as_bytes()).await?;
                return Ok(());
            }

            warn!(client = %self.addr, "Failed authorization attempt");
            self.send_raw(AUTH_FAILED.as_bytes()).await?;
        }
    }

    /// The main read-execute-reply loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some((tokens, consumed)) = parse_request(&self.buffer) {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.addr,
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed request"
                );

                let reply = match tokens {
                    Ok(tokens) => {
                        if is_quit(&tokens) {
                            return Ok(());
                        }
                        let reply = self.command_handler.execute(&tokens).await;
                        self.stats.command_processed();
                        reply
                    }
                    Err(e) => {
                        warn!(client = %self.addr, error = %e, "Parse error");
                        Reply::error(e.to_string())
                    }
                };

                self.send_reply(&reply).await?;
            }

            self.read_more_data().await?;
        }
    }

    /// Returns the next raw line, reading from the socket as needed.
    async fn next_line(&mut self) -> Result<String, ConnectionError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let line = self.buffer.split_to(pos + 1);
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }

            self.read_more_data().await?;
        }
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    /// Sends a reply to the client.
    async fn send_reply(&mut self, reply: &Reply) -> Result<(), ConnectionError> {
        self.send_raw(&reply.serialize()).await
    }

    async fn send_raw(&mut self, bytes: &[u8]) -> Result<(), ConnectionError> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(client = %self.addr, bytes = bytes.len(), "Sent reply");
        Ok(())
    }
}

fn is_quit(tokens: &[String]) -> bool {
    tokens.first().is_some_and(|verb| {
        verb.eq_ignore_ascii_case("QUIT") || verb.eq_ignore_ascii_case("EXIT")
    })
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Client disconnected normally
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Unexpected end of stream (partial request)
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// Buffer size limit exceeded
    #[error("Buffer size limit exceeded")]
    BufferFull,
}

/// Handles a client connection.
///
/// This is a convenience function that creates a ConnectionHandler
/// and runs it to completion.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler,
    password: Option<String>,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr, command_handler, password, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "Connection ended with error");
            }
        }
    }
}
