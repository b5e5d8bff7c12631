mod command;
mod config;
mod connect;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use self::command::Cli;

mod consts {
    pub const THREAD_NAME: &str = "tunelo-client";

    pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 20;
}

fn main() {
    // stdout carries tunneled bytes
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if let Err(err) = Cli::parse().run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
