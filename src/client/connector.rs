use std::sync::Arc;

use snafu::ResultExt;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tokio_util::sync::CancellationToken;

use crate::{
    client::{
        ClientHandshake, ProxyStream, TlsConnector,
        error::{self, Error},
    },
    common::{HostAddress, ProxyHost},
};

/// Opens tunnels through one configured proxy server.
///
/// The connector holds no per-connection state and can be cloned and shared
/// between tasks.
#[derive(Clone, Debug)]
pub struct ProxyConnector {
    proxy: Arc<ProxyHost>,
    tls: Option<TlsConnector>,
}

impl ProxyConnector {
    pub fn new(proxy: ProxyHost) -> Result<Self, Error> {
        let tls = match proxy {
            ProxyHost::HttpsTunnel { certificate_verification, .. } => {
                Some(TlsConnector::new(certificate_verification)?)
            }
            _ => None,
        };
        Ok(Self { proxy: Arc::new(proxy), tls })
    }

    #[inline]
    #[must_use]
    pub fn proxy(&self) -> &ProxyHost { &self.proxy }

    /// Performs the proxy handshake over `stream`, which must already be
    /// connected to the proxy server, and returns a tunnel to `target`.
    ///
    /// The stream is dropped if the handshake fails.
    pub async fn connect<Stream>(
        &self,
        target: &HostAddress,
        stream: Stream,
    ) -> Result<ProxyStream<Stream>, Error>
    where
        Stream: AsyncRead + AsyncWrite + Unpin,
    {
        let server = self.proxy.host_address();
        let handshake_context =
            || error::HandshakeSnafu { protocol: self.proxy.protocol(), server: server.clone() };
        tracing::debug!("Connect to {} via {}", target, self.proxy);

        match self.proxy.as_ref() {
            ProxyHost::Socks4a { credential, .. } => {
                let id = credential.as_ref().map(|credential| credential.user_name.as_bytes());
                let mut handshake = ClientHandshake::new(stream);
                handshake
                    .handshake_socks_v4_tcp_connect(target, id)
                    .await
                    .with_context(|_| handshake_context())?;
                Ok(ProxyStream::Plain(handshake.into_inner()))
            }
            ProxyHost::Socks5 { credential, .. } => {
                let mut handshake = ClientHandshake::new(stream);
                let _bind_socket = handshake
                    .handshake_socks_v5_tcp_connect(target, credential.as_ref())
                    .await
                    .with_context(|_| handshake_context())?;
                Ok(ProxyStream::Plain(handshake.into_inner()))
            }
            ProxyHost::HttpTunnel { credential, user_agent, .. }
            | ProxyHost::HttpsTunnel { credential, user_agent, .. } => {
                let (credential, user_agent) = (credential.as_ref(), user_agent.as_deref());
                // only HTTPS proxies carry a TLS connector
                match &self.tls {
                    Some(tls) => {
                        let stream = tls.connect(server, stream).await?;
                        let mut handshake = ClientHandshake::new(stream);
                        handshake
                            .handshake_http_tunnel(target, credential, user_agent)
                            .await
                            .with_context(|_| handshake_context())?;
                        Ok(ProxyStream::from(handshake.into_inner()))
                    }
                    None => {
                        let mut handshake = ClientHandshake::new(stream);
                        handshake
                            .handshake_http_tunnel(target, credential, user_agent)
                            .await
                            .with_context(|_| handshake_context())?;
                        Ok(ProxyStream::Plain(handshake.into_inner()))
                    }
                }
            }
        }
    }

    /// Same as [`ProxyConnector::connect`], but gives up with
    /// [`Error::Cancelled`] as soon as `token` is cancelled.
    ///
    /// The stream is dropped on cancellation, its position is unknown.
    pub async fn connect_with_cancellation<Stream>(
        &self,
        target: &HostAddress,
        stream: Stream,
        token: &CancellationToken,
    ) -> Result<ProxyStream<Stream>, Error>
    where
        Stream: AsyncRead + AsyncWrite + Unpin,
    {
        tokio::select! {
            biased;
            () = token.cancelled() => {
                tracing::debug!("Connecting to {} via {} is cancelled", target, self.proxy);
                Err(Error::Cancelled)
            }
            result = self.connect(target, stream) => result,
        }
    }

    /// Dials the proxy server over TCP and performs the handshake.
    pub async fn connect_tcp(&self, target: &HostAddress) -> Result<ProxyStream<TcpStream>, Error> {
        let server = self.proxy.host_address();
        let stream = TcpStream::connect(server.to_string())
            .await
            .with_context(|_| error::ConnectProxyServerSnafu { server: server.clone() })?;
        self.connect(target, stream).await
    }
}
