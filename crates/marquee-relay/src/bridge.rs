//! Per-connection bridge between a client session and the query engine.
//!
//! One connection carries exactly one exchange: read the client's search
//! request, translate it to a query, open a downstream session, forward the
//! query, then relay result rows back until a sentinel. Sentinels are
//! consumed here; the client learns the stream is over by the session
//! closing.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use marquee_protocol::{
    MAX_MESSAGE_BYTES, MessageReader, Reply, build_query, decode_request, write_message,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::error::RelayError;
use crate::upstream::Downstream;

/// Per-connection deadlines and limits, resolved from config once at startup.
#[derive(Debug, Clone)]
pub struct BridgeLimits {
    /// Deadline for the client request read and for each downstream reply.
    pub read_timeout: Duration,
    /// Maximum bytes in one client request.
    pub max_request_bytes: usize,
}

/// How a completed exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// The engine sent its end-of-results sentinel after `rows` rows.
    Completed { rows: u64 },
    /// The engine reported an empty result set.
    NoResults,
}

/// Drive one client connection through the full exchange.
///
/// The downstream session is opened only after the request decodes; a
/// malformed request never touches the engine. On every path that opened a
/// downstream session, that session is shut down before the client's.
pub async fn run_bridge<S, D>(
    client: S,
    downstream: &D,
    limits: &BridgeLimits,
    peer: SocketAddr,
) -> Result<BridgeOutcome, RelayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    D: Downstream,
{
    let mut client = client;

    let raw = read_request(&mut client, limits).await?;
    let request = decode_request(&raw)?;
    let query = build_query(&request);
    debug!(peer = %peer, query = %query, "request decoded");

    let session = downstream.connect().await?;
    let mut engine = MessageReader::new(session, MAX_MESSAGE_BYTES);

    let result = relay_replies(&mut client, &mut engine, &query, limits, peer).await;

    // Teardown order: engine session first, then the client session.
    let _ = engine.get_mut().shutdown().await;
    let _ = client.shutdown().await;

    result
}

/// Read the client's request: one write from the client, which may or may
/// not carry a trailing NUL.
async fn read_request<S>(client: &mut S, limits: &BridgeLimits) -> Result<Bytes, RelayError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(limits.max_request_bytes + 1);
    let n = tokio::time::timeout(limits.read_timeout, client.read_buf(&mut buf))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "request read timed out"))??;
    if n == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "client closed before sending a request",
        )
        .into());
    }
    while buf.last() == Some(&0) {
        buf.truncate(buf.len() - 1);
    }
    if buf.len() > limits.max_request_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("request exceeds {} bytes", limits.max_request_bytes),
        )
        .into());
    }
    Ok(buf.freeze())
}

/// Forward the query, then relay rows until a sentinel or end of stream.
async fn relay_replies<S, E>(
    client: &mut S,
    engine: &mut MessageReader<E>,
    query: &str,
    limits: &BridgeLimits,
    peer: SocketAddr,
) -> Result<BridgeOutcome, RelayError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    E: AsyncRead + AsyncWrite + Unpin,
{
    write_message(engine.get_mut(), query.as_bytes()).await?;

    let mut rows: u64 = 0;
    loop {
        let msg = tokio::time::timeout(limits.read_timeout, engine.next_message())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "reply read timed out"))??;

        let Some(payload) = msg else {
            // Engine hung up without a sentinel. The rows already relayed
            // stand; the client sees the same close it would after DONE.
            debug!(peer = %peer, rows, "engine closed without sentinel");
            return Ok(BridgeOutcome::Completed { rows });
        };

        match Reply::from_payload(&payload) {
            Reply::Row(row) => {
                write_message(client, row).await?;
                rows += 1;
                trace!(peer = %peer, rows, "row relayed");
            }
            Reply::NoResults => return Ok(BridgeOutcome::NoResults),
            Reply::Done => return Ok(BridgeOutcome::Completed { rows }),
        }
    }
}
