use std::fmt;

use serde::{Deserialize, Serialize};

/// User name and password presented to a proxy server.
///
/// SOCKS4 only transmits `user_name` (as USERID), SOCKS5 uses both for the
/// username/password subnegotiation and HTTP sends them as a `Basic`
/// `Proxy-Authorization` header.
#[derive(Clone, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Credential {
    pub user_name: String,

    #[serde(default)]
    pub password: String,
}

impl Credential {
    #[inline]
    #[must_use]
    pub fn new<U, P>(user_name: U, password: P) -> Self
    where
        U: Into<String>,
        P: Into<String>,
    {
        Self { user_name: user_name.into(), password: password.into() }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_name", &self.user_name)
            .field("password", &"********")
            .finish()
    }
}
