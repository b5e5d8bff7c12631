use std::{path::PathBuf, time::Duration};

use snafu::Snafu;
use tunelo_client::common::HostAddress;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Could not initialize tokio runtime, error: {}", source))]
    InitializeTokioRuntime { source: std::io::Error },

    #[snafu(display("Could not write to standard output, error: {}", source))]
    WriteStdout { source: std::io::Error },

    #[snafu(display("Read configuration file {}, error: {}", file_name.display(), source))]
    ReadConfigFile { source: std::io::Error, file_name: PathBuf },

    #[snafu(display("Deserialize configuration file {}, error: {}", file_name.display(), source))]
    DeserializeConfig { source: toml::de::Error, file_name: PathBuf },

    #[snafu(display("No proxy server is provided, use `--proxy` or `--config`"))]
    NoProxyProvided,

    #[snafu(display("Could not create proxy connector, error: {}", source))]
    CreateConnector { source: tunelo_client::client::Error },

    #[snafu(display("Could not connect to {}, error: {}", target, source))]
    Connect { target: HostAddress, source: tunelo_client::client::Error },

    #[snafu(display("Connecting to {} timed out after {:?}", target, timeout))]
    ConnectTimeout { target: HostAddress, timeout: Duration },

    #[snafu(display("Could not relay data to {}, error: {}", target, source))]
    Relay { target: HostAddress, source: std::io::Error },
}
