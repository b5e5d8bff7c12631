use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    client::handshake::{ClientHandshake, Error},
    common::{Credential, HostAddress},
    protocol::socks::{
        Address,
        v5::{
            HandshakeReply, HandshakeRequest, Method, Reply, ReplyField, Request,
            UserPasswordHandshakeReply, UserPasswordHandshakeRequest,
        },
    },
};

impl<Stream> ClientHandshake<Stream>
where
    Stream: AsyncRead + AsyncWrite + Unpin,
{
    /// Runs a SOCKS5 CONNECT and returns the address the proxy bound for the
    /// tunnel.
    ///
    /// The credential and the target are validated before anything is
    /// written to the stream.
    pub async fn handshake_socks_v5_tcp_connect(
        &mut self,
        destination_socket: &HostAddress,
        credential: Option<&Credential>,
    ) -> Result<HostAddress, Error> {
        let auth_request = credential
            .map(|credential| {
                UserPasswordHandshakeRequest::new(
                    credential.user_name.as_bytes(),
                    credential.password.as_bytes(),
                )
            })
            .transpose()?;
        let request = Request::new(Address::new(destination_socket.clone())?);

        let methods = if auth_request.is_some() {
            vec![Method::NoAuthentication, Method::UsernamePassword]
        } else {
            vec![Method::NoAuthentication]
        };
        self.send(&HandshakeRequest::new(methods).to_bytes()).await?;

        let HandshakeReply { method } = HandshakeReply::from_reader(&mut self.stream).await?;
        tracing::debug!("SOCKS5 server selected method: {}", method);
        match method {
            Method::NoAuthentication => {}
            Method::UsernamePassword => {
                let auth_request = auth_request.ok_or(Error::AuthenticationRequired)?;
                self.send(&auth_request.to_bytes()).await?;

                let reply = UserPasswordHandshakeReply::from_reader(&mut self.stream).await?;
                if !reply.is_success() {
                    return Err(Error::AuthenticationRejected {
                        version: reply.version,
                        status: reply.status,
                    });
                }
                tracing::debug!("SOCKS5 authentication succeeded");
            }
            method => return Err(Error::UnsupportedSocksMethod { method }),
        }

        self.send(&request.to_bytes()).await?;

        let Reply { reply, bind_socket } = Reply::from_reader(&mut self.stream).await?;
        match reply {
            ReplyField::Success => {
                tracing::debug!(
                    "SOCKS5 tunnel to {} is established, bound address: {}",
                    destination_socket,
                    bind_socket
                );
                Ok(bind_socket.into_inner())
            }
            field => Err(Error::ConnectRejected { code: u16::from(u8::from(field)) }),
        }
    }
}
