use snafu::Snafu;

use crate::{
    client::handshake::{self, ErrorKind},
    common::{HostAddress, ProxyProtocol},
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Could not connect proxy server {}, error: {}", server, source))]
    ConnectProxyServer { server: HostAddress, source: std::io::Error },

    #[snafu(display("{} handshake with {} failed, error: {}", protocol, server, source))]
    Handshake { protocol: ProxyProtocol, server: HostAddress, source: handshake::Error },

    #[snafu(display("Invalid TLS server name `{}`, error: {}", name, source))]
    InvalidServerName { name: String, source: rustls_pki_types::InvalidDnsNameError },

    #[snafu(display("Could not build TLS configuration, error: {}", source))]
    BuildTlsConfig { source: tokio_rustls::rustls::Error },

    #[snafu(display("Could not establish TLS session with {}, error: {}", server, source))]
    EstablishTls { server: HostAddress, source: std::io::Error },

    #[snafu(display("Connecting through proxy is cancelled"))]
    Cancelled,
}

impl Error {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectProxyServer { .. } => ErrorKind::Io,
            Self::Handshake { source, .. } => source.kind(),
            Self::InvalidServerName { .. }
            | Self::BuildTlsConfig { .. }
            | Self::EstablishTls { .. } => ErrorKind::Tls,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Code reported by the proxy server when it refused the CONNECT request.
    #[must_use]
    pub const fn rejection_code(&self) -> Option<u16> {
        match self {
            Self::Handshake { source, .. } => source.rejection_code(),
            _ => None,
        }
    }

    /// Protocol of the proxy whose handshake failed.
    #[must_use]
    pub const fn protocol(&self) -> Option<ProxyProtocol> {
        match self {
            Self::Handshake { protocol, .. } => Some(*protocol),
            _ => None,
        }
    }
}
