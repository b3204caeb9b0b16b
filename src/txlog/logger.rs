//! Background Transaction Log Writer
//!
//! Every successful write is recorded as one line in `<dir>/tx_log`:
//!
//! ```text
//! 1700000000 [SET name Ariz 10m]
//! 1700000003 [DREM users bob]
//! ```
//!
//! ## Design
//!
//! Callers never touch the file. They push lines into an unbounded channel
//! through a cloneable [`TxLogger`] handle, and a single Tokio task owns the
//! file and appends them in order. A slow disk therefore never stalls a
//! request.
//!
//! The task stops when the [`TxLogWriter`] guard is shut down or dropped. It
//! drains whatever is still queued, flushes, and exits.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};

/// File name of the log inside its directory.
pub const TX_LOG_FILE: &str = "tx_log";

/// A cheap, cloneable handle used to submit log lines.
#[derive(Debug, Clone)]
pub struct TxLogger {
    tx: mpsc::UnboundedSender<String>,
}

/// Owns the background writer task.
///
/// When this guard is dropped, the writer drains pending lines and stops.
#[derive(Debug)]
pub struct TxLogWriter {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
    /// The writer task, taken by `shutdown`
    task: Option<JoinHandle<()>>,
    /// Path of the log file
    path: PathBuf,
}

impl TxLogger {
    /// Opens (or creates) `<dir>/tx_log` in append mode and starts the
    /// writer task.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shardcache::txlog::TxLogger;
    ///
    /// # async fn demo() -> std::io::Result<()> {
    /// let (logger, writer) = TxLogger::open("tx_logs").await?;
    /// logger.submit("1700000000 [SET k v 10m]\n".to_string());
    ///
    /// // Drains and flushes before returning
    /// writer.shutdown().await;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open(dir: impl AsRef<Path>) -> io::Result<(TxLogger, TxLogWriter)> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;

        let path = dir.join(TX_LOG_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(writer_loop(BufWriter::new(file), rx, shutdown_rx));

        info!(path = %path.display(), "Transaction log opened");

        Ok((
            TxLogger { tx },
            TxLogWriter {
                shutdown_tx,
                task: Some(task),
                path,
            },
        ))
    }

    /// Queues one line for the writer. Never blocks.
    ///
    /// Lines submitted after the writer has stopped are dropped.
    pub fn submit(&self, line: String) {
        if self.tx.send(line).is_err() {
            debug!("Transaction log writer stopped, dropping line");
        }
    }
}

impl TxLogWriter {
    /// Returns the path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stops the writer and waits until everything queued is on disk.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Transaction log writer task failed");
            }
        }
    }
}

impl Drop for TxLogWriter {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// The main writer loop.
async fn writer_loop(
    mut out: BufWriter<File>,
    mut rx: mpsc::UnboundedReceiver<String>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            line = rx.recv() => match line {
                Some(line) => {
                    write_line(&mut out, &line).await;

                    // Batch whatever else is already queued before flushing
                    while let Ok(line) = rx.try_recv() {
                        write_line(&mut out, &line).await;
                    }
                    flush(&mut out).await;
                }
                None => {
                    debug!("All transaction log handles dropped");
                    break;
                }
            },
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Transaction log writer received shutdown signal");
                    while let Ok(line) = rx.try_recv() {
                        write_line(&mut out, &line).await;
                    }
                    break;
                }
            }
        }
    }

    flush(&mut out).await;
    info!("Transaction log closed");
}

async fn write_line(out: &mut BufWriter<File>, line: &str) {
    match out.write_all(line.as_bytes()).await {
        Ok(()) => trace!(bytes = line.len(), "Transaction logged"),
        Err(e) => error!(error = %e, "Failed to write transaction log"),
    }
}

async fn flush(out: &mut BufWriter<File>) {
    if let Err(e) = out.flush().await {
        error!(error = %e, "Failed to flush transaction log");
    }
}
