use std::sync::Arc;

use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use snafu::ResultExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::{
    client::TlsStream,
    rustls::{
        self, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
        client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
        crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature},
    },
};

use crate::{
    client::error::{self, Error},
    common::{CertificateVerification, HostAddress},
};

/// Opens TLS sessions to HTTPS proxy servers.
#[derive(Clone)]
pub struct TlsConnector {
    inner: tokio_rustls::TlsConnector,
    verification: CertificateVerification,
}

impl TlsConnector {
    pub fn new(verification: CertificateVerification) -> Result<Self, Error> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .context(error::BuildTlsConfigSnafu)?;

        let config = match verification {
            CertificateVerification::Disabled => builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoCertificateVerification { provider }))
                .with_no_client_auth(),
            CertificateVerification::WebPki => {
                let mut root_store = RootCertStore::empty();
                root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
                builder.with_root_certificates(root_store).with_no_client_auth()
            }
        };

        Ok(Self { inner: tokio_rustls::TlsConnector::from(Arc::new(config)), verification })
    }

    #[inline]
    #[must_use]
    pub const fn verification(&self) -> CertificateVerification { self.verification }

    /// Runs the TLS handshake over `stream`, using the host part of `server`
    /// as the server name.
    pub async fn connect<Stream>(
        &self,
        server: &HostAddress,
        stream: Stream,
    ) -> Result<TlsStream<Stream>, Error>
    where
        Stream: AsyncRead + AsyncWrite + Unpin,
    {
        let server_name = server_name(server)?;
        tracing::debug!("Establish TLS session with {}", server);
        self.inner
            .connect(server_name, stream)
            .await
            .with_context(|_| error::EstablishTlsSnafu { server: server.clone() })
    }
}

impl std::fmt::Debug for TlsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConnector").field("verification", &self.verification).finish()
    }
}

fn server_name(server: &HostAddress) -> Result<ServerName<'static>, Error> {
    match server {
        HostAddress::Socket(socket) => Ok(ServerName::from(socket.ip())),
        HostAddress::DomainName(host, _) => ServerName::try_from(host.clone())
            .with_context(|_| error::InvalidServerNameSnafu { name: host.clone() }),
    }
}

/// Accepts whatever certificate the proxy presents, signatures are still
/// checked so that the handshake itself stays sound.
#[derive(Debug)]
struct NoCertificateVerification {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv6Addr, SocketAddr};

    use rustls_pki_types::ServerName;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::{TlsConnector, server_name};
    use crate::{
        client::ErrorKind,
        common::{CertificateVerification, HostAddress},
    };

    #[test]
    fn test_server_name() {
        let name = server_name(&HostAddress::new_domain("proxy.example.com", 443)).unwrap();
        assert_eq!(name, ServerName::try_from("proxy.example.com").unwrap());

        let name =
            server_name(&SocketAddr::new(Ipv6Addr::LOCALHOST.into(), 443).into()).unwrap();
        assert!(matches!(name, ServerName::IpAddress(_)));

        let err = server_name(&HostAddress::new_domain("bad name!", 443)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Tls);
    }

    #[test]
    fn test_build_connectors() {
        for verification in [CertificateVerification::Disabled, CertificateVerification::WebPki] {
            let connector = TlsConnector::new(verification).unwrap();
            assert_eq!(connector.verification(), verification);
        }
    }

    #[tokio::test]
    async fn test_handshake_failure() {
        let (client, mut server) = tokio::io::duplex(4096);

        let proxy = tokio::spawn(async move {
            let mut client_hello = [0u8; 5];
            server.read_exact(&mut client_hello).await.unwrap();
            // TLS handshake record
            assert_eq!(client_hello[0], 0x16);
            server.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await.unwrap();
        });

        let connector = TlsConnector::new(CertificateVerification::Disabled).unwrap();
        let err = connector
            .connect(&HostAddress::new_domain("proxy.example.com", 443), client)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Tls);
        proxy.await.unwrap();
    }
}
