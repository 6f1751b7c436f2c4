//! Line-framed record reader over an async byte stream.

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use crate::cancel::CancelToken;
use crate::decode::{decode_into, Decode};
use crate::error::HiveError;

pub const DEFAULT_LINE_DELIMITER: u8 = b'\n';

const DEFAULT_MAX_RECORD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_BUFFER_CAPACITY: usize = 128 * 1024;

/// Reads one delimited line at a time from an underlying stream and decodes
/// it through the record codec. No parser state is kept between records.
pub struct HiveReader<R> {
    inner: BufReader<R>,
    line_delimiter: u8,
    max_record_bytes: usize,
    line: Vec<u8>,
}

/// Build with `HiveReaderBuilder::new().line_delimiter(..).build(stream)`.
#[derive(Clone, Debug)]
pub struct HiveReaderBuilder {
    line_delimiter: u8,
    max_record_bytes: usize,
    buffer_capacity: usize,
}

impl HiveReaderBuilder {
    pub fn new() -> Self {
        Self {
            line_delimiter: DEFAULT_LINE_DELIMITER,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    pub fn line_delimiter(mut self, delimiter: u8) -> Self {
        self.line_delimiter = delimiter;
        self
    }

    /// Cap on a single record line; longer input fails with
    /// [`HiveError::TooLarge`] instead of growing without bound.
    pub fn max_record_bytes(mut self, bytes: usize) -> Self {
        self.max_record_bytes = bytes;
        self
    }

    pub fn buffer_capacity(mut self, bytes: usize) -> Self {
        self.buffer_capacity = bytes;
        self
    }

    pub fn build<R: AsyncRead + Unpin>(self, inner: R) -> HiveReader<R> {
        HiveReader {
            inner: BufReader::with_capacity(self.buffer_capacity, inner),
            line_delimiter: self.line_delimiter,
            max_record_bytes: self.max_record_bytes,
            line: Vec::new(),
        }
    }
}

impl Default for HiveReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncRead + Unpin> HiveReader<R> {
    /// Reader with `\n` as the record delimiter.
    pub fn new(inner: R) -> Self {
        HiveReaderBuilder::new().build(inner)
    }

    pub fn with_delimiter(inner: R, line_delimiter: u8) -> Self {
        HiveReaderBuilder::new()
            .line_delimiter(line_delimiter)
            .build(inner)
    }

    /// Decode the next record into `target`. [`HiveError::Eof`] signals
    /// normal exhaustion of the underlying stream; a final line without a
    /// trailing delimiter still counts as a record.
    pub async fn decode_next<T: Decode + ?Sized>(
        &mut self,
        target: &mut T,
    ) -> Result<(), HiveError> {
        if !self.read_line().await? {
            return Err(HiveError::Eof);
        }
        tracing::trace!(len = self.line.len(), "record line read");
        decode_into(&self.line, target)
    }

    /// Adapt the reader into a stream of decoded records, ending cleanly at
    /// end of input.
    pub fn records<T>(
        mut self,
    ) -> impl Stream<Item = Result<T, HiveError>> + Unpin + Send + 'static
    where
        T: Decode + Default + Send + 'static,
        R: Send + 'static,
    {
        try_stream! {
            loop {
                let mut value = T::default();
                match self.decode_next(&mut value).await {
                    Ok(()) => yield value,
                    Err(HiveError::Eof) => break,
                    Err(e) => {
                        Err(e)?;
                    }
                }
            }
        }
        .boxed()
    }

    /// Accumulate bytes up to (but excluding) the next line delimiter.
    /// Returns false on a clean end of stream with no pending bytes.
    async fn read_line(&mut self) -> Result<bool, HiveError> {
        self.line.clear();
        loop {
            let (used, found) = {
                let chunk = self.inner.fill_buf().await?;
                if chunk.is_empty() {
                    return Ok(!self.line.is_empty());
                }
                match chunk.iter().position(|&b| b == self.line_delimiter) {
                    Some(pos) => {
                        self.line.extend_from_slice(&chunk[..pos]);
                        (pos + 1, true)
                    }
                    None => {
                        self.line.extend_from_slice(chunk);
                        (chunk.len(), false)
                    }
                }
            };
            self.inner.consume(used);
            if self.line.len() > self.max_record_bytes {
                return Err(HiveError::TooLarge(self.max_record_bytes));
            }
            if found {
                return Ok(true);
            }
        }
    }
}

/// Decode every record from `reader` into `sink` until end of stream.
///
/// The channel is created (and later closed) by the caller. Cancellation is
/// observed at each I/O boundary and never leaves a partially delivered
/// record; a dropped receiver surfaces as [`HiveError::Closed`].
pub async fn decode_all<R, T>(
    cancel: &CancelToken,
    reader: &mut HiveReader<R>,
    sink: mpsc::Sender<T>,
) -> Result<(), HiveError>
where
    R: AsyncRead + Unpin,
    T: Decode + Default,
{
    let mut records = 0u64;
    loop {
        let mut value = T::default();
        tokio::select! {
            _ = cancel.cancelled() => return Err(HiveError::Cancelled),
            read = reader.decode_next(&mut value) => match read {
                Ok(()) => {}
                Err(HiveError::Eof) => {
                    tracing::debug!(records, "record stream drained");
                    return Ok(());
                }
                Err(e) => return Err(e),
            },
        }
        tokio::select! {
            _ = cancel.cancelled() => return Err(HiveError::Cancelled),
            sent = sink.send(value) => {
                if sent.is_err() {
                    return Err(HiveError::Closed);
                }
            }
        }
        records += 1;
    }
}
