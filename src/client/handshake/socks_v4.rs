use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    client::handshake::{ClientHandshake, Error},
    common::HostAddress,
    protocol::socks::v4::{Reply, ReplyField, Request},
};

impl<Stream> ClientHandshake<Stream>
where
    Stream: AsyncRead + AsyncWrite + Unpin,
{
    /// Runs a SOCKS4 CONNECT, switching to SOCKS4a for targets that are not
    /// IPv4 literals.
    pub async fn handshake_socks_v4_tcp_connect(
        &mut self,
        destination_socket: &HostAddress,
        id: Option<&[u8]>,
    ) -> Result<(), Error> {
        let req = Request::new(destination_socket.clone(), id.unwrap_or_default())?;
        tracing::debug!(
            "Send {} CONNECT request for {}",
            if req.is_socks4a() { "SOCKS4a" } else { "SOCKS4" },
            destination_socket
        );
        self.send(&req.to_bytes()).await?;

        let reply = Reply::from_reader(&mut self.stream).await?;
        match reply.reply {
            ReplyField::Granted => {
                tracing::debug!("SOCKS4 tunnel to {} is established", destination_socket);
                Ok(())
            }
            field => Err(Error::ConnectRejected { code: u16::from(u8::from(field)) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use crate::{
        client::handshake::{ClientHandshake, ErrorKind},
        common::HostAddress,
    };

    #[tokio::test]
    async fn test_socks4_connect() {
        let (client, mut server) = tokio::io::duplex(64);
        let target = HostAddress::Socket(SocketAddr::new(Ipv4Addr::new(10, 0, 0, 7).into(), 22));

        let proxy = tokio::spawn(async move {
            let mut req = [0u8; 9];
            server.read_exact(&mut req).await.unwrap();
            server.write_all(&[0x00, 0x5a, 0, 0, 0, 0, 0, 0]).await.unwrap();
            server.write_all(b"SSH").await.unwrap();
            req
        });

        let mut handshake = ClientHandshake::new(client);
        handshake.handshake_socks_v4_tcp_connect(&target, None).await.unwrap();

        let mut client = handshake.into_inner();
        let mut payload = [0u8; 3];
        client.read_exact(&mut payload).await.unwrap();
        assert_eq!(&payload, b"SSH");

        let req = proxy.await.unwrap();
        assert_eq!(req, [0x04, 0x01, 0x00, 0x16, 10, 0, 0, 7, 0x00]);
    }

    #[tokio::test]
    async fn test_socks4a_connect_rejected() {
        let (client, mut server) = tokio::io::duplex(64);
        let target = HostAddress::new_domain("example.com", 80);

        let proxy = tokio::spawn(async move {
            let mut req = vec![0u8; 8 + 6 + 12];
            server.read_exact(&mut req).await.unwrap();
            server.write_all(&[0x00, 0x5b, 0, 0, 0, 0, 0, 0]).await.unwrap();
            req
        });

        let mut handshake = ClientHandshake::new(client);
        let err = handshake
            .handshake_socks_v4_tcp_connect(&target, Some(&b"alice"[..]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectRejected);
        assert_eq!(err.rejection_code(), Some(0x5b));

        let req = proxy.await.unwrap();
        assert_eq!(&req[..8], [0x04, 0x01, 0x00, 0x50, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(&req[8..], b"alice\0example.com\0");
    }

    #[tokio::test]
    async fn test_socks4_ipv6_target() {
        let (client, mut server) = tokio::io::duplex(64);
        let target = HostAddress::Socket(SocketAddr::new(Ipv6Addr::LOCALHOST.into(), 80));

        let mut handshake = ClientHandshake::new(client);
        let err = handshake.handshake_socks_v4_tcp_connect(&target, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTarget);

        drop(handshake);
        let mut sent = Vec::new();
        server.read_to_end(&mut sent).await.unwrap();
        assert!(sent.is_empty());
    }

    #[tokio::test]
    async fn test_socks4_ip_literal_domain_name() {
        let (client, mut server) = tokio::io::duplex(64);
        let target = HostAddress::new_domain("10.0.0.7", 22);

        let proxy = tokio::spawn(async move {
            let mut req = [0u8; 9];
            server.read_exact(&mut req).await.unwrap();
            server.write_all(&[0x00, 0x5a, 0, 0, 0, 0, 0, 0]).await.unwrap();
            req
        });

        let mut handshake = ClientHandshake::new(client);
        handshake.handshake_socks_v4_tcp_connect(&target, None).await.unwrap();
        assert_eq!(proxy.await.unwrap(), [0x04, 0x01, 0x00, 0x16, 10, 0, 0, 7, 0x00]);

        let (client, mut server) = tokio::io::duplex(64);
        let mut handshake = ClientHandshake::new(client);
        let err = handshake
            .handshake_socks_v4_tcp_connect(&HostAddress::new_domain("::1", 22), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTarget);

        drop(handshake);
        let mut sent = Vec::new();
        server.read_to_end(&mut sent).await.unwrap();
        assert!(sent.is_empty());
    }

    #[tokio::test]
    async fn test_socks4_truncated_reply() {
        let (client, mut server) = tokio::io::duplex(64);
        let target = HostAddress::new_domain("example.com", 80);

        let proxy = tokio::spawn(async move {
            let mut req = [0u8; 8 + 1 + 12];
            server.read_exact(&mut req).await.unwrap();
            server.write_all(&[0x00, 0x5a, 0x00]).await.unwrap();
        });

        let mut handshake = ClientHandshake::new(client);
        let err = handshake.handshake_socks_v4_tcp_connect(&target, None).await.unwrap_err();
        proxy.await.unwrap();
        assert_eq!(err.kind(), ErrorKind::StreamTruncated);
    }

    #[tokio::test]
    async fn test_socks4_bad_reply_version() {
        let (client, mut server) = tokio::io::duplex(64);
        let target = HostAddress::Socket(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 80));

        let proxy = tokio::spawn(async move {
            let mut req = [0u8; 9];
            server.read_exact(&mut req).await.unwrap();
            server.write_all(&[0x04, 0x5a, 0, 0, 0, 0, 0, 0]).await.unwrap();
        });

        let mut handshake = ClientHandshake::new(client);
        let err = handshake.handshake_socks_v4_tcp_connect(&target, None).await.unwrap_err();
        proxy.await.unwrap();
        assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
    }
}
