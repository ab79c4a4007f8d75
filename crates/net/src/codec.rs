use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest payload a frame can carry: the 2-byte header is length-inclusive,
/// so a u16 total length bounds the payload at 65535 - 2.
pub const MAX_PAYLOAD_LEN: usize = 65533;

const HEADER_LEN: usize = 2;

#[derive(Debug, Error)]
pub enum FrameError {
    /// The stream ended in the middle of a header or payload.
    #[error("truncated frame")]
    Truncated,
    /// The declared total length cannot describe a valid frame.
    #[error("invalid frame length: {0}")]
    Length(u16),
    #[error("frame io: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads length-prefixed frames from a byte stream.
///
/// Wire format: 2-byte little-endian total length (header inclusive),
/// followed by `total_length - 2` payload bytes. The codec is stateless with
/// respect to the protocol: no encryption, no opcode parsing.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
    buf: BytesMut,
}

impl<R> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(4 * 1024),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Read one frame payload.
    ///
    /// Returns `Ok(Some(payload))` for a complete frame, `Ok(None)` on clean
    /// EOF at a frame boundary. EOF inside a header or payload is
    /// `FrameError::Truncated`.
    pub async fn read_frame(&mut self) -> Result<Option<Bytes>, FrameError> {
        loop {
            if self.buf.len() >= HEADER_LEN {
                let total = u16::from_le_bytes([self.buf[0], self.buf[1]]);
                let total_len = total as usize;
                if total_len < HEADER_LEN + 1 {
                    return Err(FrameError::Length(total));
                }
                let payload_len = total_len - HEADER_LEN;

                if self.buf.len() >= HEADER_LEN + payload_len {
                    self.buf.advance(HEADER_LEN);
                    return Ok(Some(self.buf.split_to(payload_len).freeze()));
                }
            }

            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(FrameError::Truncated);
            }
        }
    }
}

/// Writes length-prefixed frames to a byte stream.
#[derive(Debug)]
pub struct FrameWriter<W> {
    inner: W,
}

impl<W> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Write header and payload as one contiguous buffer in a single write,
    /// so a tiny header is never split from its payload by Nagle delays.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<(), FrameError> {
        if payload.is_empty() || payload.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::Length(payload.len().min(u16::MAX as usize) as u16));
        }
        let total = (payload.len() + HEADER_LEN) as u16;
        let mut frame = Vec::with_capacity(payload.len() + HEADER_LEN);
        frame.extend_from_slice(&total.to_le_bytes());
        frame.extend_from_slice(payload);
        self.inner.write_all(&frame).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), FrameError> {
        self.inner.flush().await?;
        Ok(())
    }
}
