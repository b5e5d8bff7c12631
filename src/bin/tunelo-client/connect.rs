use std::{
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use futures::FutureExt;
use snafu::{OptionExt, ResultExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tunelo_client::{
    client::ProxyConnector,
    common::{HostAddress, ProxyHost},
};

use crate::{
    config::Config,
    consts,
    error::{self, Error},
};

const RELAY_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Clone, Debug)]
pub struct ConnectOptions {
    pub proxy: ProxyHost,
    pub timeout: Duration,
}

impl ConnectOptions {
    /// Command line flags take precedence over the configuration file.
    pub fn resolve(
        proxy: Option<ProxyHost>,
        config_file: Option<PathBuf>,
        timeout: Option<u64>,
    ) -> Result<Self, Error> {
        let config = config_file.map(Config::load).transpose()?;
        let timeout = timeout
            .map(Duration::from_secs)
            .or_else(|| config.as_ref().and_then(Config::timeout))
            .unwrap_or(Duration::from_secs(consts::DEFAULT_CONNECTION_TIMEOUT_SECS));
        let proxy = proxy
            .or_else(|| config.map(|config| config.proxy))
            .context(error::NoProxyProvidedSnafu)?;

        Ok(Self { proxy, timeout })
    }
}

pub async fn run(options: ConnectOptions, target: HostAddress) -> Result<(), Error> {
    let ConnectOptions { proxy, timeout } = options;
    let connector = ProxyConnector::new(proxy).context(error::CreateConnectorSnafu)?;

    let token = CancellationToken::new();
    let signal_handle = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("SIGINT received, closing tunnel");
                token.cancel();
            }
        })
    };

    tracing::info!("Connecting to {} via {}", target, connector.proxy());
    let result = async {
        let stream = tokio::select! {
            biased;
            () = token.cancelled() => return Ok(()),
            result = tokio::time::timeout(timeout, connector.connect_tcp(&target)) => {
                match result {
                    Ok(result) => {
                        result.with_context(|_| error::ConnectSnafu { target: target.clone() })?
                    }
                    Err(_) => {
                        return Err(Error::ConnectTimeout { target: target.clone(), timeout });
                    }
                }
            }
        };
        tracing::info!("Tunnel to {} is established", target);

        tokio::select! {
            biased;
            () = token.cancelled() => Ok(()),
            result = relay(stream, tokio::io::stdin(), tokio::io::stdout()) => {
                let (sent, received) =
                    result.with_context(|_| error::RelaySnafu { target: target.clone() })?;
                tracing::info!(
                    "Tunnel to {} is closed, sent: {} bytes, received: {} bytes",
                    target,
                    sent,
                    received
                );
                Ok(())
            }
        }
    }
    .await;

    signal_handle.abort();
    result
}

/// Copies `input` into the tunnel and the tunnel into `output` until the
/// remote side closes.
///
/// End of `input` only shuts down the write half, bytes still arriving from
/// the remote side are copied until it closes as well.
async fn relay<Stream, Input, Output>(
    stream: Stream,
    mut input: Input,
    mut output: Output,
) -> std::io::Result<(u64, u64)>
where
    Stream: AsyncRead + AsyncWrite + Unpin,
    Input: AsyncRead + Unpin,
    Output: AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    // readable while the upstream copy is still pending
    let sent = AtomicU64::new(0);
    let upstream = async {
        let mut buf = vec![0u8; RELAY_BUFFER_SIZE];
        loop {
            let n = input.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n]).await?;
            writer.flush().await?;
            let _ = sent.fetch_add(n as u64, Ordering::Relaxed);
        }
        writer.shutdown().await
    }
    .fuse();
    let downstream = async {
        let n = tokio::io::copy(&mut reader, &mut output).await?;
        output.flush().await?;
        Ok::<_, std::io::Error>(n)
    }
    .fuse();
    futures::pin_mut!(upstream, downstream);

    futures::select! {
        received = downstream => Ok((sent.load(Ordering::Relaxed), received?)),
        result = upstream => {
            result?;
            let received = downstream.await?;
            Ok((sent.load(Ordering::Relaxed), received))
        }
    }
}
