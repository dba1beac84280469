//! NUL-terminated message framing and response sentinels.
//!
//! The downstream engine writes each reply as a NUL-terminated string of at
//! most [`MAX_MESSAGE_BYTES`] payload bytes. Framing on the terminator (and
//! not on read boundaries) keeps sentinel detection correct when TLS records
//! split or coalesce messages.

use std::io;

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum payload bytes in one message.
pub const MAX_MESSAGE_BYTES: usize = 256;

/// Sentinel payload: the query matched nothing.
pub const SENTINEL_NO_RESULTS: &str = "NO RESULTS";

/// Sentinel payload: all result rows have been sent.
pub const SENTINEL_DONE: &str = "DONE";

/// A classified response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply<'a> {
    /// A result row to forward verbatim.
    Row(&'a [u8]),
    NoResults,
    Done,
}

impl<'a> Reply<'a> {
    /// Classify a message payload against the termination sentinels.
    pub fn from_payload(payload: &'a [u8]) -> Self {
        if payload == SENTINEL_NO_RESULTS.as_bytes() {
            Reply::NoResults
        } else if payload == SENTINEL_DONE.as_bytes() {
            Reply::Done
        } else {
            Reply::Row(payload)
        }
    }
}

/// Buffered reader that yields one message at a time.
///
/// A message ends at a NUL byte. EOF ends the stream; a non-empty
/// unterminated tail before EOF is yielded as a final message, because the
/// request side of the protocol writes no terminator.
pub struct MessageReader<R> {
    inner: R,
    buf: BytesMut,
    max_message_bytes: usize,
    eof: bool,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(inner: R, max_message_bytes: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(max_message_bytes + 1),
            max_message_bytes,
            eof: false,
        }
    }

    /// Access the underlying stream, e.g. to write on a bidirectional
    /// channel. Buffered read data is unaffected.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Read the next message payload, without its terminator.
    ///
    /// Returns `Ok(None)` at end of stream. Fails with
    /// `io::ErrorKind::InvalidData` if a message exceeds the size limit
    /// before its terminator arrives.
    pub async fn next_message(&mut self) -> io::Result<Option<Bytes>> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == 0) {
                if pos > self.max_message_bytes {
                    return Err(oversized(self.max_message_bytes));
                }
                let payload = self.buf.split_to(pos).freeze();
                self.buf.advance(1); // drop the terminator
                return Ok(Some(payload));
            }

            if self.eof {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                if self.buf.len() > self.max_message_bytes {
                    return Err(oversized(self.max_message_bytes));
                }
                return Ok(Some(self.buf.split().freeze()));
            }

            if self.buf.len() > self.max_message_bytes {
                return Err(oversized(self.max_message_bytes));
            }

            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                self.eof = true;
            }
        }
    }
}

fn oversized(max: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("message exceeds {} bytes", max),
    )
}

/// Write one message: payload followed by a NUL terminator, flushed.
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    writer.write_all(payload).await?;
    writer.write_all(&[0]).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, duplex};

    #[tokio::test]
    async fn yields_messages_across_split_writes() {
        let (mut tx, rx) = duplex(64);
        let writer = tokio::spawn(async move {
            // "A\0B\0DONE\0" delivered in awkward chunks.
            tx.write_all(b"A\0B").await.unwrap();
            tx.write_all(b"\0DO").await.unwrap();
            tx.write_all(b"NE\0").await.unwrap();
        });

        let mut reader = MessageReader::new(rx, MAX_MESSAGE_BYTES);
        assert_eq!(reader.next_message().await.unwrap().unwrap().as_ref(), b"A");
        assert_eq!(reader.next_message().await.unwrap().unwrap().as_ref(), b"B");
        let last = reader.next_message().await.unwrap().unwrap();
        assert_eq!(Reply::from_payload(&last), Reply::Done);
        writer.await.unwrap();
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unterminated_tail_is_a_final_message() {
        let (mut tx, rx) = duplex(64);
        tx.write_all(b"name = 'Up'/location = ''").await.unwrap();
        drop(tx);

        let mut reader = MessageReader::new(rx, MAX_MESSAGE_BYTES);
        let msg = reader.next_message().await.unwrap().unwrap();
        assert_eq!(msg.as_ref(), b"name = 'Up'/location = ''");
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_message_is_rejected() {
        let (mut tx, rx) = duplex(1024);
        tx.write_all(&[b'x'; 600]).await.unwrap();
        drop(tx);

        let mut reader = MessageReader::new(rx, MAX_MESSAGE_BYTES);
        let err = reader.next_message().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn write_message_appends_terminator() {
        let (mut tx, rx) = duplex(64);
        write_message(&mut tx, b"hello").await.unwrap();
        drop(tx);

        let mut reader = MessageReader::new(rx, MAX_MESSAGE_BYTES);
        assert_eq!(
            reader.next_message().await.unwrap().unwrap().as_ref(),
            b"hello"
        );
        assert!(reader.next_message().await.unwrap().is_none());
    }

    #[test]
    fn sentinel_classification_is_exact() {
        assert_eq!(Reply::from_payload(b"NO RESULTS"), Reply::NoResults);
        assert_eq!(Reply::from_payload(b"DONE"), Reply::Done);
        assert_eq!(Reply::from_payload(b"DONE "), Reply::Row(b"DONE "));
        assert_eq!(Reply::from_payload(b""), Reply::Row(b""));
    }
}
