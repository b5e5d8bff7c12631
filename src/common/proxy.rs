use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use url::{Host, Url};

use crate::common::{Credential, HostAddress};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProxyHostError {
    #[snafu(display("Could not parse proxy URL `{}`, error: {}", url, source))]
    ParseUrl { url: String, source: url::ParseError },

    #[snafu(display("Unknown proxy scheme: {}", scheme))]
    UnknownScheme { scheme: String },

    #[snafu(display("No host is provided in proxy URL `{}`", url))]
    NoHostProvided { url: String },

    #[snafu(display("Could not decode credential in proxy URL, error: {}", source))]
    DecodeCredential { source: std::str::Utf8Error },
}

/// Tunnel protocol spoken with a proxy server.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProxyProtocol {
    Socks4a,
    Socks5,
    Http,
    Https,
}

impl ProxyProtocol {
    #[inline]
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Socks4a | Self::Socks5 => 1080,
            Self::Http => 80,
            Self::Https => 443,
        }
    }

    #[inline]
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Socks4a => "socks4a",
            Self::Socks5 => "socks5",
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socks4a => write!(f, "SOCKS4a"),
            Self::Socks5 => write!(f, "SOCKS5"),
            Self::Http => write!(f, "HTTP"),
            Self::Https => write!(f, "HTTPS"),
        }
    }
}

/// How the certificate presented by an HTTPS proxy is checked.
///
/// # Security
///
/// The default is [`CertificateVerification::Disabled`], which accepts any
/// certificate for the proxy. The tunnel is then encrypted but not
/// authenticated, so anyone able to intercept the connection to the proxy can
/// impersonate it. Use [`CertificateVerification::WebPki`] whenever the proxy
/// presents a publicly trusted certificate.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum CertificateVerification {
    #[default]
    #[serde(rename = "disabled")]
    Disabled,

    /// Validate against the Mozilla root store bundled by `webpki-roots`.
    #[serde(rename = "webpki")]
    WebPki,
}

/// Configuration of one proxy server.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ProxyHost {
    #[serde(rename = "socks4a")]
    Socks4a { server: HostAddress, credential: Option<Credential> },

    #[serde(rename = "socks5")]
    Socks5 { server: HostAddress, credential: Option<Credential> },

    #[serde(rename = "http")]
    HttpTunnel {
        server: HostAddress,
        credential: Option<Credential>,
        user_agent: Option<String>,
    },

    #[serde(rename = "https")]
    HttpsTunnel {
        server: HostAddress,
        credential: Option<Credential>,
        user_agent: Option<String>,
        #[serde(default)]
        certificate_verification: CertificateVerification,
    },
}

impl ProxyHost {
    #[must_use]
    pub fn new(
        protocol: ProxyProtocol,
        server: HostAddress,
        credential: Option<Credential>,
    ) -> Self {
        match protocol {
            ProxyProtocol::Socks4a => Self::Socks4a { server, credential },
            ProxyProtocol::Socks5 => Self::Socks5 { server, credential },
            ProxyProtocol::Http => Self::HttpTunnel { server, credential, user_agent: None },
            ProxyProtocol::Https => Self::HttpsTunnel {
                server,
                credential,
                user_agent: None,
                certificate_verification: CertificateVerification::default(),
            },
        }
    }

    #[must_use]
    pub const fn protocol(&self) -> ProxyProtocol {
        match self {
            Self::Socks4a { .. } => ProxyProtocol::Socks4a,
            Self::Socks5 { .. } => ProxyProtocol::Socks5,
            Self::HttpTunnel { .. } => ProxyProtocol::Http,
            Self::HttpsTunnel { .. } => ProxyProtocol::Https,
        }
    }

    #[must_use]
    pub const fn host_address(&self) -> &HostAddress {
        match self {
            Self::Socks4a { server, .. }
            | Self::Socks5 { server, .. }
            | Self::HttpTunnel { server, .. }
            | Self::HttpsTunnel { server, .. } => server,
        }
    }

    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        match self {
            Self::Socks4a { credential, .. }
            | Self::Socks5 { credential, .. }
            | Self::HttpTunnel { credential, .. }
            | Self::HttpsTunnel { credential, .. } => credential.as_ref(),
        }
    }
}

impl FromStr for ProxyHost {
    type Err = ProxyHostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s).context(ParseUrlSnafu { url: s })?;

        let protocol = match url.scheme() {
            "socks4" | "socks4a" => ProxyProtocol::Socks4a,
            "socks5" | "socks5h" => ProxyProtocol::Socks5,
            "http" => ProxyProtocol::Http,
            "https" => ProxyProtocol::Https,
            scheme => return Err(ProxyHostError::UnknownScheme { scheme: scheme.to_owned() }),
        };

        let port = url.port().unwrap_or_else(|| protocol.default_port());
        let server = match url.host() {
            // hosts of non-special schemes are opaque, IP literals arrive as domains
            Some(Host::Domain(host)) => match host.parse::<IpAddr>() {
                Ok(ip) => HostAddress::Socket(SocketAddr::new(ip, port)),
                Err(_) => HostAddress::DomainName(host.to_owned(), port),
            },
            Some(Host::Ipv4(ip)) => HostAddress::Socket(SocketAddr::new(ip.into(), port)),
            Some(Host::Ipv6(ip)) => HostAddress::Socket(SocketAddr::new(ip.into(), port)),
            None => return Err(ProxyHostError::NoHostProvided { url: s.to_owned() }),
        };

        let credential = if url.username().is_empty() {
            None
        } else {
            let decode = |raw: &str| -> Result<String, ProxyHostError> {
                Ok(percent_encoding::percent_decode_str(raw)
                    .decode_utf8()
                    .context(DecodeCredentialSnafu)?
                    .into_owned())
            };
            Some(Credential {
                user_name: decode(url.username())?,
                password: decode(url.password().unwrap_or_default())?,
            })
        };

        Ok(Self::new(protocol, server, credential))
    }
}

// characters that cannot appear verbatim in the userinfo of a URL
const USERINFO: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

impl fmt::Display for ProxyHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = self.protocol().scheme();
        match self.credential() {
            Some(credential) => {
                let user_name = utf8_percent_encode(&credential.user_name, USERINFO);
                write!(f, "{scheme}://{user_name}@{}", self.host_address())
            }
            None => write!(f, "{scheme}://{}", self.host_address()),
        }
    }
}
