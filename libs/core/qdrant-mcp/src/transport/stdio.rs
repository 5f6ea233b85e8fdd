//! Line-delimited JSON-RPC over a byte stream, normally stdin/stdout.

use domain_vector::VectorRepository;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::error::{McpError, McpResult};
use crate::server::McpServer;
use crate::session::McpSession;

const TRANSPORT: &str = "stdio";

/// Serve one session until the input ends.
///
/// Each non-blank input line is one message; each response is written as one
/// line and flushed. Returns the session, which is `Closed` on return.
pub async fn serve_stdio<R, I, O>(
    server: &McpServer<R>,
    input: I,
    mut output: O,
) -> McpResult<McpSession>
where
    R: VectorRepository + 'static,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut session = McpSession::new();
    let mut lines = input.lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| McpError::io(TRANSPORT, e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(encoded) = server.handle_line(&mut session, &line).await? {
            output
                .write_all(encoded.as_bytes())
                .await
                .map_err(|e| McpError::io(TRANSPORT, e))?;
            output
                .write_all(b"\n")
                .await
                .map_err(|e| McpError::io(TRANSPORT, e))?;
            output
                .flush()
                .await
                .map_err(|e| McpError::io(TRANSPORT, e))?;
        }
    }

    session.close();
    info!("stdio input closed, session ended");
    Ok(session)
}
