use snafu::ResultExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

pub mod error;
mod http;
mod socks_v4;
mod socks_v5;

pub use self::error::{Error, ErrorKind};

/// Drives one proxy handshake over `Stream`.
///
/// The handshake borrows nothing beyond the stream, all intermediate state
/// lives on the stack of the running handshake method.
pub struct ClientHandshake<Stream> {
    stream: Stream,
}

impl<Stream> ClientHandshake<Stream>
where
    Stream: AsyncRead + AsyncWrite + Unpin,
{
    #[inline]
    pub const fn new(stream: Stream) -> Self { Self { stream } }

    #[inline]
    pub fn into_inner(self) -> Stream { self.stream }

    async fn send(&mut self, buf: &[u8]) -> Result<(), Error> {
        self.stream.write_all(buf).await.context(error::WriteStreamSnafu)?;
        self.stream.flush().await.context(error::FlushStreamSnafu)
    }
}
