pub mod consts;
pub mod error;
pub mod v4;
pub mod v5;

use std::{
    fmt,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
};

use snafu::ResultExt;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::common::HostAddress;

pub use self::error::Error;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SocksVersion {
    V4,
    V5,
}

impl From<SocksVersion> for u8 {
    fn from(version: SocksVersion) -> Self {
        match version {
            SocksVersion::V4 => consts::SOCKS4_VERSION,
            SocksVersion::V5 => consts::SOCKS5_VERSION,
        }
    }
}

impl fmt::Display for SocksVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => write!(f, "SOCKS4"),
            Self::V5 => write!(f, "SOCKS5"),
        }
    }
}

impl SocksVersion {
    #[inline]
    #[must_use]
    pub const fn serialized_len() -> usize { std::mem::size_of::<u8>() }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddressType {
    Ipv4,
    Domain,
    Ipv6,
}

impl AddressType {
    #[inline]
    #[must_use]
    pub const fn serialized_len() -> usize { std::mem::size_of::<u8>() }
}

impl TryFrom<u8> for AddressType {
    type Error = Error;

    fn try_from(ty: u8) -> Result<Self, Self::Error> {
        match ty {
            consts::SOCKS5_ADDR_TYPE_IPV4 => Ok(Self::Ipv4),
            consts::SOCKS5_ADDR_TYPE_IPV6 => Ok(Self::Ipv6),
            consts::SOCKS5_ADDR_TYPE_DOMAIN_NAME => Ok(Self::Domain),
            ty => Err(Error::InvalidAddressType { ty }),
        }
    }
}

impl From<AddressType> for u8 {
    fn from(val: AddressType) -> Self {
        match val {
            AddressType::Ipv4 => consts::SOCKS5_ADDR_TYPE_IPV4,
            AddressType::Ipv6 => consts::SOCKS5_ADDR_TYPE_IPV6,
            AddressType::Domain => consts::SOCKS5_ADDR_TYPE_DOMAIN_NAME,
        }
    }
}

// SOCKS5 address as it appears on the wire
//
// +------+----------+----------+
// | ATYP | DST.ADDR | DST.PORT |
// +------+----------+----------+
// |  1   | Variable |    2     |
// +------+----------+----------+
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Address(HostAddress);

impl Address {
    /// Wraps `host`, rejecting domain names that do not fit the one-byte
    /// length prefix. IP literals given as domain names are sent as IPs.
    pub fn new(host: HostAddress) -> Result<Self, Error> {
        let host = host.normalize();
        if let HostAddress::DomainName(ref domain, _) = host {
            if domain.len() > consts::MAX_FIELD_LEN {
                return Err(Error::DomainNameTooLong { len: domain.len() });
            }
        }
        Ok(Self(host))
    }

    pub async fn from_reader<R>(rdr: &mut R) -> Result<Self, Error>
    where
        R: AsyncRead + Unpin,
    {
        let address_type =
            AddressType::try_from(rdr.read_u8().await.context(error::ReadStreamSnafu)?)?;
        Self::from_reader_with_type(rdr, address_type).await
    }

    /// Reads the address body and port once the ATYP byte has been consumed.
    pub async fn from_reader_with_type<R>(
        rdr: &mut R,
        address_type: AddressType,
    ) -> Result<Self, Error>
    where
        R: AsyncRead + Unpin,
    {
        match address_type {
            AddressType::Ipv4 => {
                let mut buf = [0u8; 4];
                let _n = rdr.read_exact(&mut buf).await.context(error::ReadStreamSnafu)?;

                let port = rdr.read_u16().await.context(error::ReadStreamSnafu)?;
                Ok(Self(SocketAddr::new(Ipv4Addr::from(buf).into(), port).into()))
            }
            AddressType::Ipv6 => {
                let mut buf = [0u8; 16];
                let _n = rdr.read_exact(&mut buf).await.context(error::ReadStreamSnafu)?;

                let port = rdr.read_u16().await.context(error::ReadStreamSnafu)?;
                Ok(Self(SocketAddr::new(Ipv6Addr::from(buf).into(), port).into()))
            }
            AddressType::Domain => {
                let len = rdr.read_u8().await.context(error::ReadStreamSnafu)?;

                let mut host = vec![0u8; usize::from(len)];
                let _n = rdr.read_exact(&mut host).await.context(error::ReadStreamSnafu)?;

                let port = rdr.read_u16().await.context(error::ReadStreamSnafu)?;
                Ok(Self::new_domain(&host, port))
            }
        }
    }

    #[must_use]
    pub fn new_domain(host: &[u8], port: u16) -> Self {
        Self(HostAddress::DomainName(String::from_utf8_lossy(host).into_owned(), port))
    }

    #[must_use]
    pub const fn address_type(&self) -> AddressType {
        match &self.0 {
            HostAddress::Socket(SocketAddr::V4(_)) => AddressType::Ipv4,
            HostAddress::Socket(SocketAddr::V6(_)) => AddressType::Ipv6,
            HostAddress::DomainName(..) => AddressType::Domain,
        }
    }

    #[must_use]
    pub fn serialized_len(&self) -> usize {
        let body = match &self.0 {
            HostAddress::Socket(SocketAddr::V4(_)) => 4,
            HostAddress::Socket(SocketAddr::V6(_)) => 16,
            HostAddress::DomainName(host, _) => std::mem::size_of::<u8>() + host.len(),
        };
        AddressType::serialized_len() + body + std::mem::size_of::<u16>()
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        use byteorder::{BigEndian, WriteBytesExt};

        let mut buf = Vec::with_capacity(self.serialized_len());
        buf.push(self.address_type().into());
        match &self.0 {
            HostAddress::Socket(SocketAddr::V4(socket)) => buf.extend(socket.ip().octets()),
            HostAddress::Socket(SocketAddr::V6(socket)) => buf.extend(socket.ip().octets()),
            HostAddress::DomainName(host, _) => {
                // length checked in `Address::new`
                #[allow(clippy::cast_possible_truncation)]
                buf.push(host.len() as u8);
                buf.extend(host.as_bytes());
            }
        }
        let _ = buf.write_u16::<BigEndian>(self.port());
        buf
    }

    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 { self.0.port() }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> HostAddress { self.0 }
}

impl AsRef<HostAddress> for Address {
    fn as_ref(&self) -> &HostAddress { &self.0 }
}

impl From<Address> for HostAddress {
    fn from(val: Address) -> Self { val.0 }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}
