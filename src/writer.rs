//! Line-framed record writer over an async byte stream.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::cancel::CancelToken;
use crate::encode::{Encode, Encoder};
use crate::error::HiveError;
use crate::reader::DEFAULT_LINE_DELIMITER;

/// Encodes one record per line. Each record is assembled in a pooled
/// buffer, the line delimiter appended, and the whole line handed to the
/// underlying stream in a single write.
pub struct HiveWriter<W> {
    inner: W,
    line_delimiter: u8,
}

impl<W: AsyncWrite + Unpin> HiveWriter<W> {
    /// Writer with `\n` as the record delimiter.
    pub fn new(inner: W) -> Self {
        Self::with_delimiter(inner, DEFAULT_LINE_DELIMITER)
    }

    pub fn with_delimiter(inner: W, line_delimiter: u8) -> Self {
        Self {
            inner,
            line_delimiter,
        }
    }

    /// Encode `value` and write it as one delimited line.
    pub async fn encode_next<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), HiveError> {
        let mut enc = Encoder::pooled();
        value.encode(&mut enc)?;
        enc.push(self.line_delimiter);
        self.inner.write_all(enc.bytes()).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), HiveError> {
        self.inner.flush().await?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Encode every record received from `source` until the channel closes.
///
/// The channel is created and closed by the caller; a clean close drains
/// and flushes. Cancellation is observed between records.
pub async fn encode_all<W, T>(
    cancel: &CancelToken,
    writer: &mut HiveWriter<W>,
    source: &mut mpsc::Receiver<T>,
) -> Result<(), HiveError>
where
    W: AsyncWrite + Unpin,
    T: Encode,
{
    let mut records = 0u64;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Err(HiveError::Cancelled),
            received = source.recv() => match received {
                None => {
                    writer.flush().await?;
                    tracing::debug!(records, "record channel drained");
                    return Ok(());
                }
                Some(value) => {
                    writer.encode_next(&value).await?;
                    records += 1;
                }
            },
        }
    }
}
