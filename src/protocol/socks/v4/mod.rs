use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use snafu::ResultExt;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{
    common::HostAddress,
    protocol::socks::{Error, SocksVersion, consts, error},
};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReplyField {
    Granted,
    Rejected,
    Unreachable,
    InvalidId,
    Unknown(u8),
}

impl From<ReplyField> for u8 {
    fn from(val: ReplyField) -> Self {
        match val {
            ReplyField::Granted => consts::SOCKS4_REPLY_GRANTED,
            ReplyField::Rejected => consts::SOCKS4_REPLY_REJECTED,
            ReplyField::Unreachable => consts::SOCKS4_REPLY_UNREACHABLE,
            ReplyField::InvalidId => consts::SOCKS4_REPLY_INVALID_ID,
            ReplyField::Unknown(code) => code,
        }
    }
}

impl From<u8> for ReplyField {
    fn from(reply: u8) -> Self {
        match reply {
            consts::SOCKS4_REPLY_GRANTED => Self::Granted,
            consts::SOCKS4_REPLY_REJECTED => Self::Rejected,
            consts::SOCKS4_REPLY_UNREACHABLE => Self::Unreachable,
            consts::SOCKS4_REPLY_INVALID_ID => Self::InvalidId,
            code => Self::Unknown(code),
        }
    }
}

// SOCKS4 CONNECT request, SOCKS4a appends the host name after USERID
//
// +----+----+----+----+----+----+----+----+----+----+....+----+----+....+----+
// | VN | CD | DSTPORT |      DSTIP        | USERID       |NULL| HOST      |NULL|
// +----+----+----+----+----+----+----+----+----+----+....+----+----+....+----+
//   1    1      2              4           variable       1    variable    1
#[derive(Debug, Clone)]
pub struct Request {
    destination_socket: HostAddress,
    id: Vec<u8>,
}

impl Request {
    /// Builds a CONNECT request.
    ///
    /// IPv4 literals are sent as plain SOCKS4, everything else except IPv6
    /// literals is sent as a SOCKS4a host name. A domain name holding an IP
    /// literal counts as that literal.
    pub fn new(destination_socket: HostAddress, id: &[u8]) -> Result<Self, Error> {
        let destination_socket = destination_socket.normalize();
        if id.contains(&0x00) {
            return Err(Error::InvalidNullByte { field: "SOCKS4 user ID" });
        }

        match destination_socket {
            HostAddress::Socket(SocketAddr::V6(_)) => {
                Err(Error::UnsupportedAddress { address: destination_socket })
            }
            HostAddress::DomainName(ref host, _) if host.as_bytes().contains(&0x00) => {
                Err(Error::InvalidNullByte { field: "SOCKS4a host name" })
            }
            _ => Ok(Self { destination_socket, id: id.to_vec() }),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_socks4a(&self) -> bool {
        !matches!(self.destination_socket, HostAddress::Socket(SocketAddr::V4(_)))
    }

    #[must_use]
    pub fn serialized_len(&self) -> usize {
        let host_len = match &self.destination_socket {
            HostAddress::DomainName(host, _) => host.len() + 1,
            HostAddress::Socket(_) => 0,
        };
        SocksVersion::serialized_len() + 1 + 2 + 4 + self.id.len() + 1 + host_len
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        use byteorder::{BigEndian, WriteBytesExt};

        let mut buf = Vec::with_capacity(self.serialized_len());

        buf.push(SocksVersion::V4.into());
        buf.push(consts::SOCKS4_CMD_TCP_CONNECT);
        let _ = buf.write_u16::<BigEndian>(self.destination_socket.port());

        match &self.destination_socket {
            HostAddress::Socket(SocketAddr::V4(socket)) => {
                buf.extend(socket.ip().octets());
                buf.extend(&self.id);
                buf.push(0x00);
            }
            HostAddress::Socket(SocketAddr::V6(_)) => unreachable!("rejected in `Request::new`"),
            HostAddress::DomainName(host, _) => {
                buf.extend(consts::SOCKS4A_DOMAIN_SENTINEL);
                buf.extend(&self.id);
                buf.push(0x00);
                buf.extend(host.as_bytes());
                buf.push(0x00);
            }
        }

        buf
    }
}

const REPLY_LEN: usize = 8;

// +----+----+----+----+----+----+----+----+
// | VN | CD | DSTPORT |      DSTIP        |
// +----+----+----+----+----+----+----+----+
// | 1  | 1  |    2    |         4         |
// +----+----+---------+----+----+----+----+
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Reply {
    pub reply: ReplyField,
    pub destination_socket: SocketAddrV4,
}

impl Reply {
    pub async fn from_reader<R>(rdr: &mut R) -> Result<Self, Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = [0u8; REPLY_LEN];
        let _n = rdr.read_exact(&mut buf).await.context(error::ReadStreamSnafu)?;
        Self::from_bytes(buf)
    }

    pub fn from_bytes(buf: [u8; REPLY_LEN]) -> Result<Self, Error> {
        if buf[0] != consts::SOCKS4_REPLY_VERSION {
            return Err(Error::InvalidReplyVersion { version: buf[0] });
        }

        let reply = ReplyField::from(buf[1]);
        let port = u16::from_be_bytes([buf[2], buf[3]]);
        let ip = Ipv4Addr::new(buf[4], buf[5], buf[6], buf[7]);
        Ok(Self { reply, destination_socket: SocketAddrV4::new(ip, port) })
    }
}
