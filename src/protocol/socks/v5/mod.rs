use std::collections::HashSet;

use snafu::ResultExt;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::protocol::socks::{Address, AddressType, Error, SocksVersion, consts, error};

#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    /// No Authentication
    NoAuthentication,

    /// GSSAPI, offered by some servers but never by this client
    GSSAPI,

    /// Username/password authentication, RFC 1929
    UsernamePassword,

    /// No acceptable methods
    NotAcceptable,

    Unassigned(u8),
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAuthentication => write!(f, "No Authentication"),
            Self::GSSAPI => write!(f, "GSSAPI"),
            Self::UsernamePassword => write!(f, "Username/password authentication method"),
            Self::NotAcceptable => write!(f, "Not acceptable authentication method"),
            Self::Unassigned(method) => write!(f, "Unassigned authentication method {method:#04x}"),
        }
    }
}

impl From<Method> for u8 {
    fn from(val: Method) -> Self {
        match val {
            Method::NoAuthentication => consts::SOCKS5_AUTH_METHOD_NONE,
            Method::GSSAPI => consts::SOCKS5_AUTH_METHOD_GSSAPI,
            Method::UsernamePassword => consts::SOCKS5_AUTH_METHOD_PASSWORD,
            Method::NotAcceptable => consts::SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE,
            Method::Unassigned(method) => method,
        }
    }
}

impl From<u8> for Method {
    fn from(method: u8) -> Self {
        match method {
            consts::SOCKS5_AUTH_METHOD_NONE => Self::NoAuthentication,
            consts::SOCKS5_AUTH_METHOD_GSSAPI => Self::GSSAPI,
            consts::SOCKS5_AUTH_METHOD_PASSWORD => Self::UsernamePassword,
            consts::SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE => Self::NotAcceptable,
            method => Self::Unassigned(method),
        }
    }
}

impl Method {
    #[inline]
    #[must_use]
    pub const fn serialized_len() -> usize { std::mem::size_of::<u8>() }
}

//  +----+----------+----------+
//  |VER | NMETHODS | METHODS  |
//  +----+----------+----------+
//  | 1  |    1     | 1 to 255 |
//  +----+----------+----------+
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HandshakeRequest {
    methods: HashSet<Method>,
}

impl HandshakeRequest {
    #[must_use]
    pub fn new(methods: Vec<Method>) -> Self { Self { methods: methods.into_iter().collect() } }

    #[must_use]
    pub fn contains_method(&self, method: Method) -> bool { self.methods.contains(&method) }

    /// Methods are written in ascending order of their code.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut methods_vec = self.methods.iter().copied().map(u8::from).collect::<Vec<u8>>();
        methods_vec.sort_unstable();

        let mut buf = Vec::with_capacity(self.serialized_len());
        buf.push(SocksVersion::V5.into());
        #[allow(clippy::cast_possible_truncation)]
        buf.push(methods_vec.len() as u8);
        buf.extend(methods_vec);
        buf
    }

    #[inline]
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        SocksVersion::serialized_len() + std::mem::size_of::<u8>() + self.methods.len()
    }
}

// +----+--------+
// |VER | METHOD |
// +----+--------+
// | 1  |   1    |
// +----+--------+
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct HandshakeReply {
    pub method: Method,
}

impl HandshakeReply {
    #[must_use]
    pub const fn new(method: Method) -> Self { Self { method } }

    pub async fn from_reader<R>(rdr: &mut R) -> Result<Self, Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 2];
        let _n = rdr.read_exact(&mut buf).await.context(error::ReadStreamSnafu)?;

        if buf[0] != consts::SOCKS5_VERSION {
            return Err(Error::InvalidSocksVersion { version: buf[0] });
        }

        Ok(Self { method: Method::from(buf[1]) })
    }
}

// +----+------+----------+------+----------+
// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
// +----+------+----------+------+----------+
// | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
// +----+------+----------+------+----------+
#[derive(Clone, Eq, PartialEq)]
pub struct UserPasswordHandshakeRequest {
    user_name: Vec<u8>,
    password: Vec<u8>,
}

impl UserPasswordHandshakeRequest {
    /// Fails when either field does not fit its one-byte length prefix.
    pub fn new(user_name: &[u8], password: &[u8]) -> Result<Self, Error> {
        if user_name.len() > consts::MAX_FIELD_LEN {
            return Err(Error::UserNameTooLong { len: user_name.len() });
        }
        if password.len() > consts::MAX_FIELD_LEN {
            return Err(Error::PasswordTooLong { len: password.len() });
        }
        Ok(Self { user_name: user_name.to_vec(), password: password.to_vec() })
    }

    #[inline]
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        std::mem::size_of::<u8>() * 3 + self.user_name.len() + self.password.len()
    }

    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_len());
        buf.push(consts::SOCKS5_USER_PASSWORD_VERSION);
        buf.push(self.user_name.len() as u8);
        buf.extend(&self.user_name);
        buf.push(self.password.len() as u8);
        buf.extend(&self.password);
        buf
    }
}

impl std::fmt::Debug for UserPasswordHandshakeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPasswordHandshakeRequest")
            .field("user_name", &String::from_utf8_lossy(&self.user_name))
            .finish_non_exhaustive()
    }
}

// +----+--------+
// |VER | STATUS |
// +----+--------+
// | 1  |   1    |
// +----+--------+
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UserPasswordHandshakeReply {
    pub version: u8,
    pub status: u8,
}

impl UserPasswordHandshakeReply {
    pub async fn from_reader<R>(reader: &mut R) -> Result<Self, Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 2];
        let _n = reader.read_exact(&mut buf).await.context(error::ReadStreamSnafu)?;
        Ok(Self { version: buf[0], status: buf[1] })
    }

    #[inline]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.version == consts::SOCKS5_USER_PASSWORD_VERSION
            && self.status == consts::SOCKS5_USER_PASSWORD_SUCCESS
    }
}

// +----+-----+-------+------+----------+----------+
// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
// +----+-----+-------+------+----------+----------+
// | 1  |  1  | X'00' |  1   | Variable |    2     |
// +----+-----+-------+------+----------+----------+
#[derive(Debug)]
pub struct Request {
    pub destination_socket: Address,
}

impl Request {
    #[inline]
    #[must_use]
    pub const fn new(destination_socket: Address) -> Self { Self { destination_socket } }

    #[inline]
    #[must_use]
    pub const fn address_type(&self) -> AddressType { self.destination_socket.address_type() }

    #[inline]
    #[must_use]
    pub fn serialized_len(&self) -> usize {
        SocksVersion::serialized_len()
            + std::mem::size_of::<u8>() * 2
            + self.destination_socket.serialized_len()
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_len());
        buf.push(SocksVersion::V5.into());
        buf.push(consts::SOCKS5_CMD_TCP_CONNECT);
        buf.push(consts::SOCKS5_RESERVED);
        buf.extend(self.destination_socket.to_bytes());
        buf
    }
}

// +----+-----+-------+------+----------+----------+
// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
// +----+-----+-------+------+----------+----------+
// | 1  |  1  | X'00' |  1   | Variable |    2     |
// +----+-----+-------+------+----------+----------+
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Reply {
    pub reply: ReplyField,
    pub bind_socket: Address,
}

impl Reply {
    /// Reads a whole reply, including the bound address, so that the stream
    /// is positioned on the first tunneled byte whatever `REP` says.
    pub async fn from_reader<R>(reader: &mut R) -> Result<Self, Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; 4];
        let _n = reader.read_exact(&mut buf).await.context(error::ReadStreamSnafu)?;
        let _rsv = buf[2];

        if buf[0] != consts::SOCKS5_VERSION {
            return Err(Error::InvalidSocksVersion { version: buf[0] });
        }

        let reply = ReplyField::from(buf[1]);
        let address_type = AddressType::try_from(buf[3])?;
        let bind_socket = Address::from_reader_with_type(reader, address_type).await?;

        Ok(Self { reply, bind_socket })
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(3 + self.bind_socket.serialized_len());
        buf.push(SocksVersion::V5.into());
        buf.push(self.reply.into());
        buf.push(consts::SOCKS5_RESERVED);
        buf.extend(self.bind_socket.to_bytes());
        buf
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ReplyField {
    Success,
    ServerFailure,
    NotAllowed,
    NetworkUnreachable,
    HostUnreachable,
    ConnectionRefused,
    TtlExpired,
    CommandNotSupported,
    AddressNotSupported,
    Unknown(u8),
}

impl From<ReplyField> for u8 {
    fn from(val: ReplyField) -> Self {
        match val {
            ReplyField::Success => consts::SOCKS5_REPLY_SUCCEEDED,
            ReplyField::ServerFailure => consts::SOCKS5_REPLY_GENERAL_FAILURE,
            ReplyField::NotAllowed => consts::SOCKS5_REPLY_CONNECTION_NOT_ALLOWED,
            ReplyField::NetworkUnreachable => consts::SOCKS5_REPLY_NETWORK_UNREACHABLE,
            ReplyField::HostUnreachable => consts::SOCKS5_REPLY_HOST_UNREACHABLE,
            ReplyField::ConnectionRefused => consts::SOCKS5_REPLY_CONNECTION_REFUSED,
            ReplyField::TtlExpired => consts::SOCKS5_REPLY_TTL_EXPIRED,
            ReplyField::CommandNotSupported => consts::SOCKS5_REPLY_COMMAND_NOT_SUPPORTED,
            ReplyField::AddressNotSupported => consts::SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED,
            ReplyField::Unknown(code) => code,
        }
    }
}

impl From<u8> for ReplyField {
    fn from(v: u8) -> Self {
        match v {
            consts::SOCKS5_REPLY_SUCCEEDED => Self::Success,
            consts::SOCKS5_REPLY_GENERAL_FAILURE => Self::ServerFailure,
            consts::SOCKS5_REPLY_CONNECTION_NOT_ALLOWED => Self::NotAllowed,
            consts::SOCKS5_REPLY_NETWORK_UNREACHABLE => Self::NetworkUnreachable,
            consts::SOCKS5_REPLY_HOST_UNREACHABLE => Self::HostUnreachable,
            consts::SOCKS5_REPLY_CONNECTION_REFUSED => Self::ConnectionRefused,
            consts::SOCKS5_REPLY_TTL_EXPIRED => Self::TtlExpired,
            consts::SOCKS5_REPLY_COMMAND_NOT_SUPPORTED => Self::CommandNotSupported,
            consts::SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED => Self::AddressNotSupported,
            code => Self::Unknown(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};

    use super::{
        HandshakeReply, HandshakeRequest, Method, Reply, ReplyField, Request,
        UserPasswordHandshakeReply, UserPasswordHandshakeRequest,
    };
    use crate::{
        common::HostAddress,
        protocol::socks::{Address, Error},
    };

    #[test]
    fn test_handshake_request() {
        let req = HandshakeRequest::new(vec![Method::UsernamePassword, Method::NoAuthentication]);
        assert!(req.contains_method(Method::UsernamePassword));
        assert_eq!(req.to_bytes(), [0x05, 0x02, 0x00, 0x02]);

        let req = HandshakeRequest::new(vec![Method::NoAuthentication]);
        assert_eq!(req.to_bytes(), [0x05, 0x01, 0x00]);
    }

    #[tokio::test]
    async fn test_handshake_reply() {
        let mut rdr: &[u8] = &[0x05, 0xff];
        let reply = HandshakeReply::from_reader(&mut rdr).await.unwrap();
        assert_eq!(reply, HandshakeReply::new(Method::NotAcceptable));

        let mut rdr: &[u8] = &[0x04, 0x00];
        assert!(matches!(
            HandshakeReply::from_reader(&mut rdr).await,
            Err(Error::InvalidSocksVersion { version: 0x04 })
        ));
    }

    #[test]
    fn test_user_password_request() {
        let req = UserPasswordHandshakeRequest::new(b"a", b"b").unwrap();
        assert_eq!(req.to_bytes(), [0x01, 0x01, b'a', 0x01, b'b']);
        assert_eq!(req.serialized_len(), 5);

        let req = UserPasswordHandshakeRequest::new(b"alice", b"s3cr3t").unwrap();
        assert!(!format!("{req:?}").contains("s3cr3t"));

        let long = vec![b'x'; 256];
        assert!(matches!(
            UserPasswordHandshakeRequest::new(&long, b"b"),
            Err(Error::UserNameTooLong { len: 256 })
        ));
        assert!(matches!(
            UserPasswordHandshakeRequest::new(b"a", &long),
            Err(Error::PasswordTooLong { len: 256 })
        ));
        assert!(UserPasswordHandshakeRequest::new(&long[..255], &long[..255]).is_ok());
    }

    #[tokio::test]
    async fn test_user_password_reply() {
        let mut rdr: &[u8] = &[0x01, 0x00];
        assert!(UserPasswordHandshakeReply::from_reader(&mut rdr).await.unwrap().is_success());

        let mut rdr: &[u8] = &[0x01, 0x01];
        assert!(!UserPasswordHandshakeReply::from_reader(&mut rdr).await.unwrap().is_success());

        let mut rdr: &[u8] = &[0x05, 0x00];
        assert!(!UserPasswordHandshakeReply::from_reader(&mut rdr).await.unwrap().is_success());
    }

    #[test]
    fn test_connect_request() {
        let addr = Address::new(HostAddress::new_domain("example.com", 443)).unwrap();
        let req = Request::new(addr);
        let mut expected = vec![0x05, 0x01, 0x00, 0x03, 0x0b];
        expected.extend(b"example.com");
        expected.extend([0x01, 0xbb]);
        assert_eq!(req.to_bytes(), expected);
        assert_eq!(req.serialized_len(), expected.len());
    }

    #[tokio::test]
    async fn test_reply_leaves_payload() {
        let bind = Address::new(SocketAddr::new(Ipv4Addr::new(10, 1, 2, 3).into(), 4321).into())
            .unwrap();
        let mut wire = Reply { reply: ReplyField::ConnectionRefused, bind_socket: bind.clone() }
            .to_bytes();
        wire.push(0xee);

        let mut rdr: &[u8] = &wire;
        let reply = Reply::from_reader(&mut rdr).await.unwrap();
        assert_eq!(reply.reply, ReplyField::ConnectionRefused);
        assert_eq!(u8::from(reply.reply), 0x05);
        assert_eq!(reply.bind_socket, bind);
        assert_eq!(rdr, &[0xee][..]);
    }

    #[tokio::test]
    async fn test_reply_bad_address_type() {
        let mut rdr: &[u8] = &[0x05, 0x00, 0x00, 0x02, 0x00];
        assert!(matches!(
            Reply::from_reader(&mut rdr).await,
            Err(Error::InvalidAddressType { ty: 0x02 })
        ));
    }
}
