use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tunelo_client::common::ProxyHost;

use crate::error::{self, Error};

/// Contents of the file passed with `--config`.
///
/// ```toml
/// timeout = 10
///
/// [proxy]
/// type = "socks5"
/// server = "127.0.0.1:1080"
/// credential = { user_name = "alice", password = "secret" }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub proxy: ProxyHost,

    /// Connection timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(file_path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(&file_path)
            .context(error::ReadConfigFileSnafu { file_name: file_path.as_ref().to_owned() })?;
        Self::from_toml(&content, file_path)
    }

    fn from_toml<P: AsRef<Path>>(content: &str, file_path: P) -> Result<Self, Error> {
        toml::from_str(content)
            .context(error::DeserializeConfigSnafu { file_name: file_path.as_ref().to_owned() })
    }

    #[inline]
    pub fn timeout(&self) -> Option<Duration> { self.timeout.map(Duration::from_secs) }
}

#[cfg(test)]
mod tests {
    use tunelo_client::common::{
        CertificateVerification, Credential, HostAddress, ProxyHost,
    };

    use super::Config;
    use crate::error::Error;

    #[test]
    fn test_load_socks5() {
        let config = Config::from_toml(
            r#"
                timeout = 10

                [proxy]
                type = "socks5"
                server = "127.0.0.1:1080"
                credential = { user_name = "alice", password = "secret" }
            "#,
            "tunelo-client.toml",
        )
        .unwrap();

        assert_eq!(config.timeout().unwrap().as_secs(), 10);
        assert_eq!(
            config.proxy,
            ProxyHost::Socks5 {
                server: "127.0.0.1:1080".parse().unwrap(),
                credential: Some(Credential::new("alice", "secret")),
            }
        );
    }

    #[test]
    fn test_load_https() {
        let config = Config::from_toml(
            r#"
                [proxy]
                type = "https"
                server = "proxy.example.com:443"
                user_agent = "tunelo-client"
                certificate_verification = "webpki"
            "#,
            "tunelo-client.toml",
        )
        .unwrap();

        assert_eq!(config.timeout, None);
        assert_eq!(
            config.proxy,
            ProxyHost::HttpsTunnel {
                server: HostAddress::new_domain("proxy.example.com", 443),
                credential: None,
                user_agent: Some("tunelo-client".to_owned()),
                certificate_verification: CertificateVerification::WebPki,
            }
        );
    }

    #[test]
    fn test_load_invalid() {
        let err = Config::from_toml(
            r#"
                [proxy]
                type = "socks5"
                server = "127.0.0.1"
            "#,
            "tunelo-client.toml",
        )
        .unwrap_err();
        assert!(matches!(err, Error::DeserializeConfig { .. }));

        let err = Config::load("/nonexistent/tunelo-client.toml").unwrap_err();
        assert!(matches!(err, Error::ReadConfigFile { .. }));
    }
}
