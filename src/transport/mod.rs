//! Glue between the frame codec and the QUIC connection it runs on.
//!
//! The codec never closes anything itself. When it raises a fatal error, the
//! [`StreamCodec`] asks the [`ConnectionHandle`] to close the connection
//! with the carried HTTP/3 error code and then returns the error.

use crate::error::{H3Error, H3ErrorCode, H3Result};
use crate::protocol::decoder::FrameDecoder;
use crate::protocol::encoder::FrameEncoder;
use crate::protocol::frame::Frame;
use crate::protocol::qpack::{HeaderCompressor, HeaderDecompressor, LiteralQpack};
use bytes::BytesMut;
use tracing::{debug, warn};

/// The connection-level side of a stream: the one thing the codec needs from
/// the transport is a way to close the connection with an error code.
pub trait ConnectionHandle {
    fn close(&mut self, code: H3ErrorCode, reason: &str);
}

impl<T: ConnectionHandle + ?Sized> ConnectionHandle for &mut T {
    fn close(&mut self, code: H3ErrorCode, reason: &str) {
        (**self).close(code, reason)
    }
}

/// Frame codec bound to one QUIC stream.
///
/// Bytes go in through [`recv`](Self::recv), frames come out; frames go in
/// through [`send`](Self::send), bytes come out. A fatal error on either path
/// closes the connection once and leaves the codec unusable.
#[derive(Debug)]
pub struct StreamCodec<H, C = LiteralQpack, D = LiteralQpack> {
    stream_id: u64,
    connection: H,
    encoder: FrameEncoder<C>,
    decoder: FrameDecoder<D>,
    close_code: Option<H3ErrorCode>,
}

impl<H: ConnectionHandle> StreamCodec<H> {
    /// Codec with literal-only QPACK and default limits.
    pub fn new(stream_id: u64, connection: H) -> Self {
        Self::with_parts(
            stream_id,
            connection,
            FrameEncoder::default(),
            FrameDecoder::default(),
        )
    }
}

impl<H, C, D> StreamCodec<H, C, D>
where
    H: ConnectionHandle,
    C: HeaderCompressor,
    D: HeaderDecompressor,
{
    pub fn with_parts(
        stream_id: u64,
        connection: H,
        encoder: FrameEncoder<C>,
        decoder: FrameDecoder<D>,
    ) -> Self {
        Self {
            stream_id,
            connection,
            encoder,
            decoder,
            close_code: None,
        }
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    pub fn connection(&self) -> &H {
        &self.connection
    }

    pub fn decoder(&self) -> &FrameDecoder<D> {
        &self.decoder
    }

    /// Code the connection was closed with, if a fatal error occurred.
    pub fn close_code(&self) -> Option<H3ErrorCode> {
        self.close_code
    }

    /// Feed received bytes, appending every completed frame to `out`.
    ///
    /// Frames completed before a fatal error stay in `out`.
    pub fn recv(&mut self, data: &[u8], out: &mut Vec<Frame>) -> H3Result<()> {
        self.ensure_open()?;

        self.decoder
            .decode_all(data, out)
            .map_err(|err| self.escalate(err))
    }

    /// Encode `frame` onto `dst`.
    pub fn send(&mut self, frame: Frame, dst: &mut BytesMut) -> H3Result<()> {
        self.ensure_open()?;
        self.encoder
            .encode(frame, dst)
            .map_err(|err| self.escalate(err))
    }

    /// The peer finished the stream.
    pub fn finish(&mut self) -> H3Result<()> {
        self.ensure_open()?;
        self.decoder.finish().map_err(|err| self.escalate(err))
    }

    fn ensure_open(&self) -> H3Result<()> {
        match self.close_code {
            Some(code) => Err(H3Error::connection(code, "connection already closed")),
            None => Ok(()),
        }
    }

    /// Close the connection for fatal errors; pass the error through.
    fn escalate(&mut self, err: H3Error) -> H3Error {
        match err.code() {
            Some(code) => {
                let reason = err.to_string();
                warn!(stream_id = self.stream_id, %code, %reason, "closing connection");
                self.connection.close(code, &reason);
                self.close_code = Some(code);
            }
            None => debug!(stream_id = self.stream_id, error = %err, "non-fatal codec error"),
        }
        err
    }
}
