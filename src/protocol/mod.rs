pub mod http;
pub mod socks;
