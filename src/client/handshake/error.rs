use std::fmt;

use snafu::Snafu;

use crate::{
    common::HostAddress,
    protocol::{http, socks, socks::v5::Method},
};

/// Coarse classification of handshake failures.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// The proxy sent something the protocol does not allow.
    ProtocolViolation,

    /// The proxy demands authentication but no credential is configured.
    AuthenticationRequired,

    /// The proxy declined the supplied credential.
    AuthenticationRejected,

    /// A credential field does not fit its length prefix, nothing was sent.
    CredentialTooLong,

    /// The proxy refused to connect to the target.
    ConnectRejected,

    /// The stream ended in the middle of a reply.
    StreamTruncated,

    Cancelled,

    /// The target can not be expressed in the chosen protocol, nothing was
    /// sent.
    InvalidTarget,

    Tls,

    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtocolViolation => write!(f, "protocol violation"),
            Self::AuthenticationRequired => write!(f, "authentication required"),
            Self::AuthenticationRejected => write!(f, "authentication rejected"),
            Self::CredentialTooLong => write!(f, "credential too long"),
            Self::ConnectRejected => write!(f, "connect rejected"),
            Self::StreamTruncated => write!(f, "stream truncated"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::InvalidTarget => write!(f, "invalid target"),
            Self::Tls => write!(f, "TLS failure"),
            Self::Io => write!(f, "I/O failure"),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Could not write stream, error: {}", source))]
    WriteStream { source: std::io::Error },

    #[snafu(display("Could not flush stream, error: {}", source))]
    FlushStream { source: std::io::Error },

    #[snafu(display("Could not read stream, error: {}", source))]
    ReadStream { source: std::io::Error },

    #[snafu(display("Stream ended before the reply was complete"))]
    StreamTruncated,

    #[snafu(display("Invalid SOCKS version: {:#04x}", version))]
    InvalidSocksVersion { version: u8 },

    #[snafu(display("Invalid SOCKS4 reply version: {:#04x}", version))]
    InvalidSocks4ReplyVersion { version: u8 },

    #[snafu(display("Invalid SOCKS address type: {:#04x}", ty))]
    InvalidSocksAddressType { ty: u8 },

    #[snafu(display("Unsupported SOCKS method: {}", method))]
    UnsupportedSocksMethod { method: Method },

    #[snafu(display("Unsupported target address: {}", address))]
    UnsupportedTargetAddress { address: HostAddress },

    #[snafu(display("{} must not contain a NUL byte", field))]
    InvalidNullByte { field: &'static str },

    #[snafu(display("Domain name is too long: {} bytes", len))]
    DomainNameTooLong { len: usize },

    #[snafu(display("SOCKS5 {} is too long: {} bytes", field, len))]
    CredentialTooLong { field: &'static str, len: usize },

    #[snafu(display("Proxy server requires authentication, but no credential is provided"))]
    AuthenticationRequired,

    #[snafu(display(
        "Proxy server rejected credential, version: {:#04x}, status: {:#04x}",
        version,
        status
    ))]
    AuthenticationRejected { version: u8, status: u8 },

    #[snafu(display("Proxy server rejected CONNECT request with code {}", code))]
    ConnectRejected { code: u16 },

    #[snafu(display("Could not build HTTP request, error: {}", source))]
    BuildHttpRequest { source: std::fmt::Error },

    #[snafu(display("Invalid value for HTTP header `{}`", name))]
    InvalidHttpHeaderValue { name: &'static str },

    #[snafu(display("Could not parse HTTP response, error: {}", source))]
    ParseHttpResponse { source: httparse::Error },

    #[snafu(display("No HTTP response code provided"))]
    NoHttpResponseCode,

    #[snafu(display("Invalid HTTP status code: {}", code))]
    InvalidHttpStatusCode { code: u16 },

    #[snafu(display("HTTP response header exceeds {} bytes", limit))]
    HttpResponseTooLarge { limit: usize },
}

impl Error {
    /// Maps a failed read onto [`Error::StreamTruncated`] when the peer closed
    /// the stream early.
    pub(crate) fn from_read(source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::StreamTruncated
        } else {
            Self::ReadStream { source }
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::WriteStream { .. } | Self::FlushStream { .. } | Self::ReadStream { .. } => {
                ErrorKind::Io
            }
            Self::StreamTruncated => ErrorKind::StreamTruncated,
            Self::InvalidSocksVersion { .. }
            | Self::InvalidSocks4ReplyVersion { .. }
            | Self::InvalidSocksAddressType { .. }
            | Self::UnsupportedSocksMethod { .. }
            | Self::BuildHttpRequest { .. }
            | Self::ParseHttpResponse { .. }
            | Self::NoHttpResponseCode
            | Self::InvalidHttpStatusCode { .. }
            | Self::HttpResponseTooLarge { .. } => ErrorKind::ProtocolViolation,
            Self::UnsupportedTargetAddress { .. }
            | Self::InvalidNullByte { .. }
            | Self::DomainNameTooLong { .. }
            | Self::InvalidHttpHeaderValue { .. } => ErrorKind::InvalidTarget,
            Self::CredentialTooLong { .. } => ErrorKind::CredentialTooLong,
            Self::AuthenticationRequired => ErrorKind::AuthenticationRequired,
            Self::AuthenticationRejected { .. } => ErrorKind::AuthenticationRejected,
            Self::ConnectRejected { .. } => ErrorKind::ConnectRejected,
        }
    }

    /// Code reported by the proxy server when it refused the CONNECT request.
    #[must_use]
    pub const fn rejection_code(&self) -> Option<u16> {
        match self {
            Self::ConnectRejected { code } => Some(*code),
            _ => None,
        }
    }
}

impl From<socks::Error> for Error {
    fn from(err: socks::Error) -> Self {
        match err {
            socks::Error::ReadStream { source } => Self::from_read(source),
            socks::Error::InvalidSocksVersion { version } => Self::InvalidSocksVersion { version },
            socks::Error::InvalidReplyVersion { version } => {
                Self::InvalidSocks4ReplyVersion { version }
            }
            socks::Error::InvalidAddressType { ty } => Self::InvalidSocksAddressType { ty },
            socks::Error::UnsupportedAddress { address } => {
                Self::UnsupportedTargetAddress { address }
            }
            socks::Error::InvalidNullByte { field } => Self::InvalidNullByte { field },
            socks::Error::DomainNameTooLong { len } => Self::DomainNameTooLong { len },
            socks::Error::UserNameTooLong { len } => {
                Self::CredentialTooLong { field: "user name", len }
            }
            socks::Error::PasswordTooLong { len } => {
                Self::CredentialTooLong { field: "password", len }
            }
        }
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        match err {
            http::Error::BuildRequest { source } => Self::BuildHttpRequest { source },
            http::Error::InvalidHeaderValue { name } => Self::InvalidHttpHeaderValue { name },
            http::Error::ParseResponse { source } => Self::ParseHttpResponse { source },
            http::Error::NoResponseCode => Self::NoHttpResponseCode,
            http::Error::InvalidStatusCode { code } => Self::InvalidHttpStatusCode { code },
        }
    }
}
