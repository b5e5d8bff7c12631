mod credential;
mod host_address;
mod proxy;

pub use self::{
    credential::Credential,
    host_address::{HostAddress, HostAddressError},
    proxy::{CertificateVerification, ProxyHost, ProxyHostError, ProxyProtocol},
};
