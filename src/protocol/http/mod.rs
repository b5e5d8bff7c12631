mod error;

use base64::engine::{Engine, general_purpose::STANDARD};
use bytes::BytesMut;
use http::StatusCode;
use snafu::ResultExt;

use crate::common::{Credential, HostAddress};

pub use self::error::Error;

/// Number of headers accepted in a proxy response.
const MAX_HEADERS: usize = 32;

/// `CONNECT host:port HTTP/1.1` followed by `Host` and the optional
/// `User-Agent` and `Proxy-Authorization` headers.
#[derive(Clone, Copy, Debug)]
pub struct ConnectRequest<'a> {
    pub target: &'a HostAddress,
    pub user_agent: Option<&'a str>,
    pub credential: Option<&'a Credential>,
}

impl ConnectRequest<'_> {
    pub fn to_bytes(&self) -> Result<BytesMut, Error> {
        use std::fmt::Write;

        // IPv6 literals must be bracketed in the authority form
        let host = self.target.clone().normalize().to_string();
        if !is_valid_header_value(&host) {
            return Err(Error::InvalidHeaderValue { name: "Host" });
        }
        if self.user_agent.is_some_and(|ua| !is_valid_header_value(ua)) {
            return Err(Error::InvalidHeaderValue { name: "User-Agent" });
        }

        let mut req = BytesMut::with_capacity(128);
        write!(req, "CONNECT {host} HTTP/1.1\r\n").context(error::BuildRequestSnafu)?;
        write!(req, "Host: {host}\r\n").context(error::BuildRequestSnafu)?;

        if let Some(ua) = self.user_agent {
            write!(req, "User-Agent: {ua}\r\n").context(error::BuildRequestSnafu)?;
        }

        if let Some(credential) = self.credential {
            write!(req, "Proxy-Authorization: {}\r\n", basic_authorization(credential))
                .context(error::BuildRequestSnafu)?;
        }

        write!(req, "\r\n").context(error::BuildRequestSnafu)?;
        Ok(req)
    }
}

fn is_valid_header_value(value: &str) -> bool {
    !value.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0x00)
}

/// Value of a `Basic` authorization header for `credential`.
#[must_use]
pub fn basic_authorization(credential: &Credential) -> String {
    let token = STANDARD.encode(format!("{}:{}", credential.user_name, credential.password));
    format!("Basic {token}")
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConnectResponse {
    pub status: StatusCode,
}

impl ConnectResponse {
    /// Parses the status line and headers.
    ///
    /// Returns `None` while the header block is incomplete, otherwise the
    /// response and the number of bytes it occupies.
    pub fn parse(buf: &[u8]) -> Result<Option<(Self, usize)>, Error> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut response = httparse::Response::new(&mut headers);
        match response.parse(buf).context(error::ParseResponseSnafu)? {
            httparse::Status::Partial => Ok(None),
            httparse::Status::Complete(parsed_len) => {
                let code = response.code.ok_or(Error::NoResponseCode)?;
                let status =
                    StatusCode::from_u16(code).map_err(|_| Error::InvalidStatusCode { code })?;
                for header in response.headers.iter() {
                    tracing::debug!(
                        "Proxy response header: {}: {}",
                        header.name,
                        String::from_utf8_lossy(header.value)
                    );
                }
                Ok(Some((Self { status }, parsed_len)))
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool { self.status.is_success() }
}
