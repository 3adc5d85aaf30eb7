//! Stdio Transport
//!
//! Reads newline-delimited JSON-RPC messages, handles each request on its own
//! task and funnels responses through a single writer so lines never interleave.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::handlers::handle_line;
use crate::state::AppState;

/// Serve until `reader` reaches EOF and all in-flight requests are answered
pub async fn serve<R, W>(state: AppState, reader: R, writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(write_lines(writer, rx));

    let mut in_flight = JoinSet::new();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let state = state.clone();
        let tx = tx.clone();
        in_flight.spawn(async move {
            let Some(response) = handle_line(&state, &line).await else {
                return;
            };
            match serde_json::to_string(&response) {
                Ok(encoded) => {
                    // The writer only goes away once every sender is dropped.
                    let _ = tx.send(encoded);
                }
                Err(e) => tracing::error!(error = %e, "Failed to encode response"),
            }
        });
    }

    tracing::debug!(pending = in_flight.len(), "Input closed, draining in-flight requests");
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Request task panicked");
        }
    }

    drop(tx);
    writer_task.await.map_err(io::Error::other)?
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}
