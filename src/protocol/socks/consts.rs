pub const SOCKS4_VERSION: u8 = 0x04;
pub const SOCKS4_REPLY_VERSION: u8 = 0x00;
pub const SOCKS4_CMD_TCP_CONNECT: u8 = 0x01;

pub const SOCKS4_REPLY_GRANTED: u8 = 0x5a;
pub const SOCKS4_REPLY_REJECTED: u8 = 0x5b;
pub const SOCKS4_REPLY_UNREACHABLE: u8 = 0x5c;
pub const SOCKS4_REPLY_INVALID_ID: u8 = 0x5d;

/// `0.0.0.x` with `x != 0` tells a SOCKS4a server that a host name follows.
pub const SOCKS4A_DOMAIN_SENTINEL: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

pub const SOCKS5_VERSION: u8 = 0x05;
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;
pub const SOCKS5_RESERVED: u8 = 0x00;

pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
pub const SOCKS5_AUTH_METHOD_GSSAPI: u8 = 0x01;
pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;
pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xff;

pub const SOCKS5_USER_PASSWORD_VERSION: u8 = 0x01;
pub const SOCKS5_USER_PASSWORD_SUCCESS: u8 = 0x00;

pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
pub const SOCKS5_ADDR_TYPE_DOMAIN_NAME: u8 = 0x03;
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

pub const SOCKS5_REPLY_SUCCEEDED: u8 = 0x00;
pub const SOCKS5_REPLY_GENERAL_FAILURE: u8 = 0x01;
pub const SOCKS5_REPLY_CONNECTION_NOT_ALLOWED: u8 = 0x02;
pub const SOCKS5_REPLY_NETWORK_UNREACHABLE: u8 = 0x03;
pub const SOCKS5_REPLY_HOST_UNREACHABLE: u8 = 0x04;
pub const SOCKS5_REPLY_CONNECTION_REFUSED: u8 = 0x05;
pub const SOCKS5_REPLY_TTL_EXPIRED: u8 = 0x06;
pub const SOCKS5_REPLY_COMMAND_NOT_SUPPORTED: u8 = 0x07;
pub const SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED: u8 = 0x08;

/// Longest value a one-byte length prefix can describe.
pub const MAX_FIELD_LEN: usize = 255;
