mod connector;
mod error;
mod handshake;
mod stream;
mod tls;

pub use self::{
    connector::ProxyConnector,
    error::Error,
    handshake::{ClientHandshake, Error as HandshakeError, ErrorKind},
    stream::ProxyStream,
    tls::TlsConnector,
};
