use std::{
    fmt,
    net::{IpAddr, SocketAddr, SocketAddrV4, SocketAddrV6},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

#[derive(Debug, Clone, Eq, PartialEq, Snafu)]
pub enum HostAddressError {
    #[snafu(display("No port is provided in `{}`", address))]
    NoPortProvided { address: String },

    #[snafu(display("Invalid port `{}` in `{}`", port, address))]
    InvalidPort { address: String, port: String },

    #[snafu(display("No host is provided in `{}`", address))]
    NoHostProvided { address: String },
}

/// A remote endpoint, either a literal socket address or a domain name that
/// is left for the proxy to resolve.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum HostAddress {
    Socket(SocketAddr),
    DomainName(String, u16),
}

impl PartialEq<SocketAddr> for HostAddress {
    fn eq(&self, other: &SocketAddr) -> bool {
        match self {
            Self::Socket(addr) => addr == other,
            Self::DomainName(..) => false,
        }
    }
}

impl HostAddress {
    #[inline]
    #[must_use]
    pub fn new_domain<S: Into<String>>(host: S, port: u16) -> Self {
        Self::DomainName(host.into(), port)
    }

    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        match self {
            Self::Socket(socket) => socket.port(),
            Self::DomainName(_, port) => *port,
        }
    }

    /// Turns a domain name that is really an IP literal, bracketed or not,
    /// into a socket address. Wire encodings depend on it.
    #[must_use]
    pub fn normalize(self) -> Self {
        if let Self::DomainName(host, port) = &self {
            let literal =
                host.strip_prefix('[').and_then(|host| host.strip_suffix(']')).unwrap_or(host);
            if let Ok(ip) = literal.parse::<IpAddr>() {
                return Self::Socket(SocketAddr::new(ip, *port));
            }
        }
        self
    }
}

impl From<SocketAddr> for HostAddress {
    fn from(addr: SocketAddr) -> Self { Self::Socket(addr) }
}

impl From<SocketAddrV4> for HostAddress {
    fn from(addr: SocketAddrV4) -> Self { Self::Socket(SocketAddr::V4(addr)) }
}

impl From<SocketAddrV6> for HostAddress {
    fn from(addr: SocketAddrV6) -> Self { Self::Socket(SocketAddr::V6(addr)) }
}

impl FromStr for HostAddress {
    type Err = HostAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(socket) = s.parse::<SocketAddr>() {
            return Ok(Self::Socket(socket));
        }

        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| HostAddressError::NoPortProvided { address: s.to_owned() })?;
        let port = port.parse::<u16>().map_err(|_| HostAddressError::InvalidPort {
            address: s.to_owned(),
            port: port.to_owned(),
        })?;

        // bracketed IPv6 literals are handled by `SocketAddr` above
        if host.is_empty() || host.starts_with('[') {
            return Err(HostAddressError::NoHostProvided { address: s.to_owned() });
        }

        match host.parse::<IpAddr>() {
            Ok(ip) => Ok(Self::Socket(SocketAddr::new(ip, port))),
            Err(_) => Ok(Self::DomainName(host.to_owned(), port)),
        }
    }
}

impl TryFrom<String> for HostAddress {
    type Error = HostAddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

impl From<HostAddress> for String {
    fn from(addr: HostAddress) -> Self { addr.to_string() }
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket(socket) => fmt::Display::fmt(socket, f),
            Self::DomainName(host, port) => write!(f, "{host}:{port}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv6Addr, SocketAddr};

    use super::{HostAddress, HostAddressError};

    #[test]
    fn test_parse() {
        assert_eq!(
            "127.0.0.1:1080".parse::<HostAddress>().unwrap(),
            HostAddress::Socket(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 1080))
        );
        assert_eq!(
            "[::1]:443".parse::<HostAddress>().unwrap(),
            HostAddress::Socket(SocketAddr::new(IpAddr::from(Ipv6Addr::LOCALHOST), 443))
        );
        assert_eq!(
            "example.com:443".parse::<HostAddress>().unwrap(),
            HostAddress::new_domain("example.com", 443)
        );
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            "example.com".parse::<HostAddress>(),
            Err(HostAddressError::NoPortProvided { .. })
        ));
        assert!(matches!(
            "example.com:http".parse::<HostAddress>(),
            Err(HostAddressError::InvalidPort { .. })
        ));
        assert!(matches!(
            "example.com:65536".parse::<HostAddress>(),
            Err(HostAddressError::InvalidPort { .. })
        ));
        assert!(matches!(
            ":80".parse::<HostAddress>(),
            Err(HostAddressError::NoHostProvided { .. })
        ));
    }

    #[test]
    fn test_display() {
        let addr = HostAddress::Socket(SocketAddr::new(IpAddr::from(Ipv6Addr::LOCALHOST), 8080));
        assert_eq!(addr.to_string(), "[::1]:8080");
        assert_eq!(HostAddress::new_domain("example.com", 80).to_string(), "example.com:80");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            HostAddress::new_domain("10.0.0.7", 22).normalize(),
            HostAddress::Socket(SocketAddr::new(IpAddr::from([10, 0, 0, 7]), 22))
        );
        assert_eq!(
            HostAddress::new_domain("::1", 22).normalize(),
            HostAddress::Socket(SocketAddr::new(IpAddr::from(Ipv6Addr::LOCALHOST), 22))
        );
        assert_eq!(
            HostAddress::new_domain("[::1]", 22).normalize(),
            HostAddress::Socket(SocketAddr::new(IpAddr::from(Ipv6Addr::LOCALHOST), 22))
        );
        assert_eq!(
            HostAddress::new_domain("example.com", 22).normalize(),
            HostAddress::new_domain("example.com", 22)
        );
    }
}
