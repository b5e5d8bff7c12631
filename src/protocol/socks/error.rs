use snafu::Snafu;

use crate::common::HostAddress;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Could not read stream, error: {}", source))]
    ReadStream { source: std::io::Error },

    #[snafu(display("Invalid SOCKS version: {}", version))]
    InvalidSocksVersion { version: u8 },

    #[snafu(display("Invalid SOCKS4 reply version: {}", version))]
    InvalidReplyVersion { version: u8 },

    #[snafu(display("Invalid address type: {}", ty))]
    InvalidAddressType { ty: u8 },

    #[snafu(display("SOCKS4 can not address {}", address))]
    UnsupportedAddress { address: HostAddress },

    #[snafu(display("{} must not contain a NUL byte", field))]
    InvalidNullByte { field: &'static str },

    #[snafu(display("Domain name is too long: {} bytes", len))]
    DomainNameTooLong { len: usize },

    #[snafu(display("User name is too long: {} bytes", len))]
    UserNameTooLong { len: usize },

    #[snafu(display("Password is too long: {} bytes", len))]
    PasswordTooLong { len: usize },
}
