use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::{
    client::handshake::{ClientHandshake, Error},
    common::{Credential, HostAddress},
    protocol::http::{ConnectRequest, ConnectResponse},
};

const INITIAL_BUF_SIZE: usize = 128;
pub const MAX_RESPONSE_HEADER_SIZE: usize = 8 * 1024;

impl<Stream> ClientHandshake<Stream>
where
    Stream: AsyncRead + AsyncWrite + Unpin,
{
    /// Sends `CONNECT` and waits for a `2xx` status.
    ///
    /// The response is read one byte at a time up to the end of its header
    /// block, so tunneled bytes sent right behind it stay in the stream.
    pub async fn handshake_http_tunnel(
        &mut self,
        target_host: &HostAddress,
        credential: Option<&Credential>,
        user_agent: Option<&str>,
    ) -> Result<(), Error> {
        let request = ConnectRequest { target: target_host, user_agent, credential }.to_bytes()?;
        tracing::debug!("Send HTTP CONNECT request for {}", target_host);
        self.send(&request).await?;

        let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);
        let response = loop {
            if buf.len() >= MAX_RESPONSE_HEADER_SIZE {
                return Err(Error::HttpResponseTooLarge { limit: MAX_RESPONSE_HEADER_SIZE });
            }

            let byte = self.stream.read_u8().await.map_err(Error::from_read)?;
            buf.put_u8(byte);
            if byte != b'\n' {
                continue;
            }

            if let Some((response, _)) = ConnectResponse::parse(&buf)? {
                break response;
            }
        };

        if response.is_success() {
            tracing::debug!(
                "HTTP tunnel to {} is established, status: {}",
                target_host,
                response.status
            );
            Ok(())
        } else {
            Err(Error::ConnectRejected { code: response.status.as_u16() })
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::MAX_RESPONSE_HEADER_SIZE;
    use crate::{
        client::handshake::{ClientHandshake, Error, ErrorKind},
        common::{Credential, HostAddress},
    };

    const REQUEST: &[u8] = b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com:443\r\n\r\n";

    #[tokio::test]
    async fn test_http_tunnel() {
        let (client, mut server) = tokio::io::duplex(256);
        let target = HostAddress::new_domain("example.com", 443);

        let proxy = tokio::spawn(async move {
            let mut req = vec![0u8; REQUEST.len()];
            server.read_exact(&mut req).await.unwrap();
            assert_eq!(req, REQUEST);
            server
                .write_all(b"HTTP/1.1 200 Connection Established\r\n\r\n\x16\x03\x01")
                .await
                .unwrap();
        });

        let mut handshake = ClientHandshake::new(client);
        handshake.handshake_http_tunnel(&target, None, None).await.unwrap();

        let mut client = handshake.into_inner();
        let mut payload = [0u8; 3];
        client.read_exact(&mut payload).await.unwrap();
        assert_eq!(payload, [0x16, 0x03, 0x01]);
        proxy.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_tunnel_with_credential() {
        let (client, mut server) = tokio::io::duplex(512);
        let target = HostAddress::new_domain("example.com", 443);
        let credential = Credential::new("user", "pass");

        let proxy = tokio::spawn(async move {
            let mut req = Vec::new();
            while !req.ends_with(b"\r\n\r\n") {
                req.push(server.read_u8().await.unwrap());
            }
            server.write_all(b"HTTP/1.0 204 No Content\r\nVia: 1.1 squid\r\n\r\n").await.unwrap();
            String::from_utf8(req).unwrap()
        });

        let mut handshake = ClientHandshake::new(client);
        handshake
            .handshake_http_tunnel(&target, Some(&credential), Some("curl/8.0"))
            .await
            .unwrap();

        let req = proxy.await.unwrap();
        assert!(req.starts_with("CONNECT example.com:443 HTTP/1.1\r\n"));
        assert!(req.contains("User-Agent: curl/8.0\r\n"));
        assert!(req.contains("Proxy-Authorization: Basic dXNlcjpwYXNz\r\n"));
    }

    #[tokio::test]
    async fn test_http_tunnel_rejected() {
        let (client, mut server) = tokio::io::duplex(256);
        let target = HostAddress::new_domain("example.com", 443);

        let proxy = tokio::spawn(async move {
            let mut req = vec![0u8; REQUEST.len()];
            server.read_exact(&mut req).await.unwrap();
            server
                .write_all(
                    b"HTTP/1.1 407 Proxy Authentication Required\r\n\
                      Proxy-Authenticate: Basic realm=\"proxy\"\r\n\r\n",
                )
                .await
                .unwrap();
        });

        let mut handshake = ClientHandshake::new(client);
        let err = handshake.handshake_http_tunnel(&target, None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectRejected);
        assert_eq!(err.rejection_code(), Some(407));
        proxy.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_tunnel_truncated() {
        let (client, mut server) = tokio::io::duplex(256);
        let target = HostAddress::new_domain("example.com", 443);

        let proxy = tokio::spawn(async move {
            let mut req = vec![0u8; REQUEST.len()];
            server.read_exact(&mut req).await.unwrap();
            server.write_all(b"HTTP/1.1 200 OK\r\n").await.unwrap();
        });

        let mut handshake = ClientHandshake::new(client);
        let err = handshake.handshake_http_tunnel(&target, None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StreamTruncated);
        proxy.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_tunnel_response_too_large() {
        let (client, mut server) = tokio::io::duplex(1024);
        let target = HostAddress::new_domain("example.com", 443);

        let proxy = tokio::spawn(async move {
            let mut req = vec![0u8; REQUEST.len()];
            server.read_exact(&mut req).await.unwrap();
            server.write_all(b"HTTP/1.1 200 OK\r\nX-Padding: ").await.unwrap();
            // the client hangs up once the limit is reached
            let padding = vec![b'a'; MAX_RESPONSE_HEADER_SIZE];
            let _unused = server.write_all(&padding).await;
        });

        let mut handshake = ClientHandshake::new(client);
        let err = handshake.handshake_http_tunnel(&target, None, None).await.unwrap_err();
        assert!(matches!(err, Error::HttpResponseTooLarge { limit: MAX_RESPONSE_HEADER_SIZE }));
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
        drop(handshake);
        proxy.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_tunnel_garbage_response() {
        let (client, mut server) = tokio::io::duplex(256);
        let target = HostAddress::new_domain("example.com", 443);

        let proxy = tokio::spawn(async move {
            let mut req = vec![0u8; REQUEST.len()];
            server.read_exact(&mut req).await.unwrap();
            server.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await.unwrap();
        });

        let mut handshake = ClientHandshake::new(client);
        let err = handshake.handshake_http_tunnel(&target, None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
        proxy.await.unwrap();
    }
}
