use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Could not build HTTP request, error: {}", source))]
    BuildRequest { source: std::fmt::Error },

    #[snafu(display("Could not parse HTTP response, error: {}", source))]
    ParseResponse { source: httparse::Error },

    #[snafu(display("Invalid value for HTTP header `{}`", name))]
    InvalidHeaderValue { name: &'static str },

    #[snafu(display("No HTTP response code provided"))]
    NoResponseCode,

    #[snafu(display("Invalid HTTP status code: {}", code))]
    InvalidStatusCode { code: u16 },
}
